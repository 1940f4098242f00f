//! Annotation-driven transaction management
//!
//! [`EnableTransactionManagement`] annotates a configuration definition and
//! attaches [`TransactionManagementConfigurationSelector`]. When imports are
//! processed the selector validates the configuration, registers the
//! auto-proxy creator and then the transaction infrastructure beans:
//!
//! | bean                                     | instance                                  |
//! |------------------------------------------|-------------------------------------------|
//! | [`TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME`] | `Arc<dyn TransactionAttributeSource>`   |
//! | [`TRANSACTION_INTERCEPTOR_BEAN_NAME`]      | [`TransactionInterceptor`]              |
//! | [`TRANSACTION_ADVISOR_BEAN_NAME`]          | [`TransactionAttributeSourceAdvisor`]   |
//! | [`TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME`] | [`TransactionalEventListenerFactory`] |
//!
//! Definitions the user already registered under those names are kept.

use std::sync::Arc;

use anvil_core::{
    AdviceMode, AnnotationAttributes, AnnotationMetadata, AttributeValue, Bean, BeanDefinition,
    BeanDefinitionRegistry, ConfigurableBeanFactory, Error, ImportRegistrar, MethodDescriptor,
    Ordered, Result, Role, LOWEST_PRECEDENCE,
};
use tracing::{debug, info};

use crate::advisor::{TransactionAttributeSourceAdvisor, ADVISOR, TRANSACTION_ADVISOR_BEAN_NAME};
use crate::interceptor::{TransactionInterceptor, TRANSACTION_INTERCEPTOR_BEAN_NAME};
use crate::manager::{
    configurer_of, transaction_manager_of, PlatformTransactionManager,
    PLATFORM_TRANSACTION_MANAGER, TRANSACTION_MANAGEMENT_CONFIGURER,
};
use crate::registrar::{AspectJAutoProxyRegistrar, AutoProxyRegistrar, ENABLE_ASPECTJ_AUTO_PROXY};
use crate::source::{AnnotationTransactionAttributeSource, TransactionAttributeSource};

/// Annotation written by [`EnableTransactionManagement`]
pub const ENABLE_TRANSACTION_MANAGEMENT: &str = "EnableTransactionManagement";

/// Annotation marking methods as transaction-bound event listeners
pub const TRANSACTIONAL_EVENT_LISTENER: &str = "TransactionalEventListener";

pub const TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME: &str = "transactionAttributeSource";

pub const TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME: &str =
    "anvil.transaction.config.internalTransactionalListenerFactory";

/// Enables annotation-driven transactions on a configuration definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableTransactionManagement {
    pub mode: AdviceMode,
    pub proxy_target_class: bool,
    /// Order of the transaction advisor
    pub order: i32,
}

impl Default for EnableTransactionManagement {
    fn default() -> Self {
        Self {
            mode: AdviceMode::Proxy,
            proxy_target_class: false,
            order: LOWEST_PRECEDENCE,
        }
    }
}

impl EnableTransactionManagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: AdviceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn proxy_target_class(mut self) -> Self {
        self.proxy_target_class = true;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn attributes(&self) -> AnnotationAttributes {
        AnnotationAttributes::new()
            .with("mode", AttributeValue::Mode(self.mode))
            .with("proxyTargetClass", AttributeValue::Bool(self.proxy_target_class))
            .with("order", AttributeValue::Int(i64::from(self.order)))
    }

    /// Annotate `definition` and attach the configuration selector
    pub fn apply(&self, definition: BeanDefinition) -> BeanDefinition {
        definition
            .annotate(ENABLE_TRANSACTION_MANAGEMENT, self.attributes())
            .with_import(Arc::new(TransactionManagementConfigurationSelector::new()))
    }
}

/// Enables annotation-declared aspects on a configuration definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnableAspectJAutoProxy {
    pub proxy_target_class: bool,
    pub expose_proxy: bool,
}

impl EnableAspectJAutoProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proxy_target_class(mut self) -> Self {
        self.proxy_target_class = true;
        self
    }

    pub fn expose_proxy(mut self) -> Self {
        self.expose_proxy = true;
        self
    }

    pub fn apply(&self, definition: BeanDefinition) -> BeanDefinition {
        let attributes = AnnotationAttributes::new()
            .with("proxyTargetClass", AttributeValue::Bool(self.proxy_target_class))
            .with("exposeProxy", AttributeValue::Bool(self.expose_proxy));
        definition
            .annotate(ENABLE_ASPECTJ_AUTO_PROXY, attributes)
            .with_import(Arc::new(AspectJAutoProxyRegistrar::new()))
    }
}

/// Chooses the transaction configuration for the annotated advice mode
#[derive(Debug, Default)]
pub struct TransactionManagementConfigurationSelector;

impl TransactionManagementConfigurationSelector {
    pub fn new() -> Self {
        Self
    }
}

impl ImportRegistrar for TransactionManagementConfigurationSelector {
    fn register_bean_definitions(
        &self,
        importing: &AnnotationMetadata,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()> {
        let attributes = importing
            .attributes_for(ENABLE_TRANSACTION_MANAGEMENT)
            .ok_or_else(|| {
                Error::missing_import_metadata(ENABLE_TRANSACTION_MANAGEMENT, importing.class_name())
            })?;

        match attributes.get_mode("mode").unwrap_or_default() {
            AdviceMode::Proxy => {
                let configuration = ProxyTransactionManagementConfiguration::from_attributes(attributes);
                configuration.validate(registry)?;
                AutoProxyRegistrar::new().register_bean_definitions(importing, registry)?;
                configuration.register(registry)
            }
            AdviceMode::AspectJ => Err(Error::invalid_config(format!(
                "@{} on {} requests AspectJ advice mode; only proxy mode is supported",
                ENABLE_TRANSACTION_MANAGEMENT,
                importing.class_name()
            ))),
        }
    }

    fn name(&self) -> &str {
        "TransactionManagementConfigurationSelector"
    }
}

/// Infrastructure beans for proxy-based transaction management
#[derive(Debug, Clone, Copy)]
pub struct ProxyTransactionManagementConfiguration {
    advisor_order: i32,
}

impl ProxyTransactionManagementConfiguration {
    pub fn from_attributes(attributes: &AnnotationAttributes) -> Self {
        let advisor_order = attributes
            .get_int("order")
            .map(|order| order.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
            .unwrap_or(LOWEST_PRECEDENCE);
        Self { advisor_order }
    }

    pub fn advisor_order(&self) -> i32 {
        self.advisor_order
    }

    /// At most one transaction-management configurer may be defined
    pub fn validate(&self, registry: &dyn BeanDefinitionRegistry) -> Result<()> {
        let configurers = registry.bean_names_for_contract(TRANSACTION_MANAGEMENT_CONFIGURER);
        if configurers.len() > 1 {
            return Err(Error::multiple_configurers(TRANSACTION_MANAGEMENT_CONFIGURER, configurers));
        }
        Ok(())
    }

    pub fn register(&self, registry: &dyn BeanDefinitionRegistry) -> Result<()> {
        let advisor_order = self.advisor_order;
        let beans = [
            (TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME, attribute_source_definition()),
            (TRANSACTION_INTERCEPTOR_BEAN_NAME, interceptor_definition()),
            (TRANSACTION_ADVISOR_BEAN_NAME, advisor_definition(advisor_order)),
            (
                TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME,
                TransactionalEventListenerFactory::definition(),
            ),
        ];

        let mut registered = 0;
        for (name, definition) in beans {
            if registry.contains_bean_definition(name) {
                info!(bean = name, "Keeping user-defined transaction infrastructure bean");
                continue;
            }
            registry.register_bean_definition(name, definition)?;
            registered += 1;
        }
        debug!(registered, advisor_order, "Registered transaction infrastructure");
        Ok(())
    }
}

fn attribute_source_definition() -> BeanDefinition {
    BeanDefinition::new("AnnotationTransactionAttributeSource")
        .with_role(Role::Infrastructure)
        .with_instance(|| {
            let source: Arc<dyn TransactionAttributeSource> =
                Arc::new(AnnotationTransactionAttributeSource::new());
            Bean::new(source)
        })
}

fn interceptor_definition() -> BeanDefinition {
    BeanDefinition::new("TransactionInterceptor")
        .with_role(Role::Infrastructure)
        .with_supplier(|factory, _| {
            let source = attribute_source(factory)?;
            let mut interceptor = TransactionInterceptor::new(source);
            if let Some(manager) = annotation_driven_manager(factory)? {
                interceptor = interceptor.with_manager(manager);
            }
            Ok(Bean::new(interceptor))
        })
}

fn advisor_definition(order: i32) -> BeanDefinition {
    BeanDefinition::new("TransactionAttributeSourceAdvisor")
        .with_role(Role::Infrastructure)
        .implementing(ADVISOR)
        .with_supplier(move |factory, _| {
            let source = attribute_source(factory)?;
            let interceptor = factory
                .get_bean(TRANSACTION_INTERCEPTOR_BEAN_NAME)?
                .downcast::<TransactionInterceptor>()
                .ok_or_else(|| {
                    Error::not_of_required_capability(TRANSACTION_INTERCEPTOR_BEAN_NAME, "TransactionInterceptor")
                })?;
            let advisor = TransactionAttributeSourceAdvisor::new()
                .with_transaction_attribute_source(source)
                .with_interceptor(interceptor)
                .with_order(order);
            Ok(Bean::new(advisor))
        })
}

fn attribute_source(factory: &dyn ConfigurableBeanFactory) -> Result<Arc<dyn TransactionAttributeSource>> {
    factory
        .get_bean(TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME)?
        .downcast::<Arc<dyn TransactionAttributeSource>>()
        .map(|source| source.as_ref().clone())
        .ok_or_else(|| {
            Error::not_of_required_capability(TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME, "TransactionAttributeSource")
        })
}

/// Manager from the single configurer, else the first manager bean
fn annotation_driven_manager(
    factory: &dyn ConfigurableBeanFactory,
) -> Result<Option<Arc<dyn PlatformTransactionManager>>> {
    let configurers = factory.bean_names_for_contract(TRANSACTION_MANAGEMENT_CONFIGURER);
    match configurers.as_slice() {
        [] => {}
        [name] => {
            let bean = factory.get_bean(name)?;
            let configurer = configurer_of(&bean)
                .ok_or_else(|| Error::not_of_required_capability(name.as_str(), TRANSACTION_MANAGEMENT_CONFIGURER))?;
            return Ok(Some(configurer.annotation_driven_transaction_manager()));
        }
        _ => return Err(Error::multiple_configurers(TRANSACTION_MANAGEMENT_CONFIGURER, configurers)),
    }

    let Some(name) = factory
        .bean_names_for_contract(PLATFORM_TRANSACTION_MANAGER)
        .into_iter()
        .next()
    else {
        debug!("No transaction manager defined; transactional calls will fail");
        return Ok(None);
    };
    let bean = factory.get_bean(&name)?;
    transaction_manager_of(&bean)
        .map(Some)
        .ok_or_else(|| Error::not_of_required_capability(name.as_str(), PLATFORM_TRANSACTION_MANAGER))
}

/// Recognizes methods annotated as transactional event listeners
#[derive(Debug, Default)]
pub struct TransactionalEventListenerFactory;

impl TransactionalEventListenerFactory {
    pub const ORDER: i32 = 50;

    pub fn new() -> Self {
        Self
    }

    pub fn definition() -> BeanDefinition {
        BeanDefinition::new("TransactionalEventListenerFactory")
            .with_role(Role::Infrastructure)
            .with_instance(|| Bean::new(TransactionalEventListenerFactory::new()))
    }

    pub fn supports_method(&self, method: &MethodDescriptor) -> bool {
        method.annotation(TRANSACTIONAL_EVENT_LISTENER).is_some()
    }
}

impl Ordered for TransactionalEventListenerFactory {
    fn order(&self) -> Option<i32> {
        Some(Self::ORDER)
    }
}
