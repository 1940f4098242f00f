//! # anvil-tx
//!
//! Transactional proxy wiring for the anvil container providing:
//! - Transaction attributes and attribute sources (annotation, name-match, composite)
//! - The transaction-attribute pointcut, interceptor and advisor
//! - Auto-proxy creator registration and the `TransactionalProxy` decorator
//! - `EnableTransactionManagement` and its import selector

pub mod advisor;
pub mod attribute;
pub mod interceptor;
pub mod management;
pub mod manager;
pub mod pointcut;
pub mod proxy;
pub mod registrar;
pub mod source;

pub use advisor::{TransactionAttributeSourceAdvisor, ADVISOR, TRANSACTION_ADVISOR_BEAN_NAME};
pub use attribute::{Isolation, Propagation, RollbackRule, TransactionAttribute, TRANSACTIONAL};
pub use interceptor::{TransactionInterceptor, TRANSACTION_INTERCEPTOR_BEAN_NAME};
pub use management::{
    EnableAspectJAutoProxy, EnableTransactionManagement, ProxyTransactionManagementConfiguration,
    TransactionManagementConfigurationSelector, TransactionalEventListenerFactory,
    ENABLE_TRANSACTION_MANAGEMENT, TRANSACTIONAL_EVENT_LISTENER,
    TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME, TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME,
};
pub use manager::{
    configurer_bean, configurer_of, transaction_manager_bean, transaction_manager_of,
    PlatformTransactionManager, TransactionManagementConfigurer, TransactionStatus,
    PLATFORM_TRANSACTION_MANAGER, TRANSACTION_MANAGEMENT_CONFIGURER,
};
pub use pointcut::{ClassFilter, Pointcut, TransactionAttributeSourcePointcut};
pub use proxy::{
    force_auto_proxy_creator_to_expose_proxy, force_auto_proxy_creator_to_use_class_proxying,
    register_aspectj_annotation_auto_proxy_creator_if_necessary,
    register_aspectj_auto_proxy_creator_if_necessary, register_auto_proxy_creator_if_necessary,
    AutoProxyCreator, ProxyCreatorKind, TransactionalProxy, AUTO_PROXY_CREATOR_BEAN_NAME,
};
pub use registrar::{AspectJAutoProxyRegistrar, AutoProxyRegistrar, ENABLE_ASPECTJ_AUTO_PROXY};
pub use source::{
    AnnotationTransactionAttributeSource, CompositeTransactionAttributeSource,
    NameMatchTransactionAttributeSource, TransactionAttributeSource,
};
