//! Transaction management integration tests
//!
//! Refreshes contexts that enable transaction management and checks:
//! - Infrastructure registration and validation failures
//! - Proxying of transactional beans only
//! - Commit and rollback through the proxy
//! - User-defined infrastructure beans and configurers taking precedence

mod common;

use std::sync::Arc;

use anvil_context::ApplicationContext;
use anvil_core::{
    AdviceMode, Bean, BeanDefinition, BeanDefinitionRegistry, BootstrapConfig, Error, Role,
    TypeMarkers,
};
use anvil_tx::{
    EnableTransactionManagement, NameMatchTransactionAttributeSource, TransactionAttribute,
    TransactionAttributeSource, TransactionAttributeSourceAdvisor, TransactionInterceptor,
    TransactionManagementConfigurationSelector, TransactionalEventListenerFactory,
    TransactionalProxy, AUTO_PROXY_CREATOR_BEAN_NAME, TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME,
    TRANSACTION_ADVISOR_BEAN_NAME, TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME,
    TRANSACTION_INTERCEPTOR_BEAN_NAME,
};
use common::*;

fn proxy_of(ctx: &ApplicationContext, name: &str) -> Arc<TransactionalProxy> {
    ctx.get_bean_as::<TransactionalProxy>(name).unwrap()
}

#[test]
fn test_enable_registers_infrastructure() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let factory = ctx.factory();
    for name in [
        AUTO_PROXY_CREATOR_BEAN_NAME,
        TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME,
        TRANSACTION_INTERCEPTOR_BEAN_NAME,
        TRANSACTION_ADVISOR_BEAN_NAME,
        TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME,
    ] {
        let definition = factory.bean_definition(name).unwrap();
        assert_eq!(definition.role(), Role::Infrastructure, "{name}");
    }

    let advisor = ctx
        .get_bean_as::<TransactionAttributeSourceAdvisor>(TRANSACTION_ADVISOR_BEAN_NAME)
        .unwrap();
    assert!(advisor.interceptor().unwrap().has_manager());
    assert!(ctx
        .get_bean_as::<TransactionalEventListenerFactory>(TRANSACTIONAL_EVENT_LISTENER_FACTORY_BEAN_NAME)
        .is_ok());
}

#[test]
fn test_transactional_bean_is_proxied() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let bean = ctx.get_bean("payService").unwrap();
    let descriptor = bean.descriptor().unwrap();
    assert!(descriptor.has_marker(TypeMarkers::TRANSACTIONAL_PROXY));
    assert!(descriptor.has_marker(TypeMarkers::PROXY));

    let proxy = proxy_of(&ctx, "payService");
    assert_eq!(proxy.target_descriptor().name(), "PayService");
    assert!(!proxy.target_descriptor().has_marker(TypeMarkers::PROXY));
    assert_eq!(proxy.advisors().len(), 1);
    assert!(!proxy.is_class_based());
    assert!(proxy.target().downcast::<PayService>().is_some());
}

#[test]
fn test_successful_call_commits() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let proxy = proxy_of(&ctx, "payService");
    let paid = proxy
        .invoke("pay", |target| target.downcast::<PayService>().unwrap().pay(25))
        .unwrap();

    assert_eq!(paid, 25);
    assert_eq!(
        manager.entries(),
        vec!["begin PayService::pay", "commit PayService::pay"]
    );
}

#[test]
fn test_failed_call_rolls_back() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let proxy = proxy_of(&ctx, "payService");
    let err = proxy
        .invoke("pay", |target| target.downcast::<PayService>().unwrap().pay(0))
        .unwrap_err();

    assert!(matches!(err, Error::Processor { .. }));
    assert_eq!(
        manager.entries(),
        vec!["begin PayService::pay", "rollback PayService::pay"]
    );
}

#[test]
fn test_no_rollback_rule_commits_failed_call() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let proxy = proxy_of(&ctx, "payService");
    let result = proxy.invoke("notify", |target| target.downcast::<PayService>().unwrap().notify());

    assert!(result.is_err());
    assert_eq!(
        manager.entries(),
        vec!["begin PayService::notify", "commit PayService::notify"]
    );
}

#[test]
fn test_non_transactional_method_skips_manager() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let proxy = proxy_of(&ctx, "payService");
    let balance = proxy
        .invoke("balance", |target| Ok(target.downcast::<PayService>().unwrap().balance()))
        .unwrap();

    assert_eq!(balance, 0);
    assert!(manager.entries().is_empty());
}

#[test]
fn test_unknown_method_is_an_error() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.refresh().unwrap();

    let result = proxy_of(&ctx, "payService").invoke("refund", |_| Ok(()));
    assert!(matches!(result, Err(Error::Processor { .. })));
}

#[test]
fn test_non_transactional_bean_is_not_proxied() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register("reportService", report_service_definition()).unwrap();
    ctx.refresh().unwrap();

    assert!(ctx.get_bean_as::<ReportService>("reportService").is_ok());
    assert!(ctx.get_bean_as::<TransactionalProxy>("reportService").is_err());
}

#[test]
fn test_already_proxied_bean_is_not_proxied_again() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register("legacyPay", proxied_service_definition()).unwrap();
    ctx.refresh().unwrap();

    assert!(ctx.get_bean_as::<PayService>("legacyPay").is_ok());
}

#[test]
fn test_bean_without_descriptor_is_not_proxied() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register(
        "plainPay",
        BeanDefinition::new("PayService").with_instance(|| Bean::new(PayService::default())),
    )
    .unwrap();
    ctx.refresh().unwrap();

    assert!(ctx.get_bean_as::<PayService>("plainPay").is_ok());
}

#[test]
fn test_infrastructure_bean_is_not_proxied() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register("internalPay", pay_service_definition().with_role(Role::Infrastructure))
        .unwrap();
    ctx.refresh().unwrap();

    assert!(ctx.get_bean_as::<PayService>("internalPay").is_ok());
}

#[test]
fn test_proxy_target_class_is_applied() {
    let manager = RecordingManager::new();
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register(
        "appConfig",
        app_config(EnableTransactionManagement::new().proxy_target_class()),
    )
    .unwrap();
    ctx.register("transactionManager", manager_definition(&manager))
        .unwrap();
    ctx.register("payService", pay_service_definition()).unwrap();
    ctx.refresh().unwrap();

    let creator = ctx.factory().bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME).unwrap();
    assert_eq!(creator.property("proxyTargetClass"), Some("true"));
    assert!(proxy_of(&ctx, "payService").is_class_based());
}

#[test]
fn test_advisor_order_comes_from_annotation() {
    let manager = RecordingManager::new();
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register("appConfig", app_config(EnableTransactionManagement::new().with_order(42)))
        .unwrap();
    ctx.register("transactionManager", manager_definition(&manager))
        .unwrap();
    ctx.refresh().unwrap();

    let advisor = ctx
        .get_bean_as::<TransactionAttributeSourceAdvisor>(TRANSACTION_ADVISOR_BEAN_NAME)
        .unwrap();
    assert_eq!(anvil_core::Ordered::order(advisor.as_ref()), Some(42));
}

#[test]
fn test_multiple_configurers_fail_before_registration() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register("configurerA", configurer_definition(&manager)).unwrap();
    ctx.register("configurerB", configurer_definition(&manager)).unwrap();

    let err = ctx.refresh().unwrap_err();
    match err {
        Error::MultipleConfigurers { found, .. } => {
            assert_eq!(found, vec!["configurerA", "configurerB"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!ctx.factory().contains_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME));
    assert!(!ctx.factory().contains_bean_definition(TRANSACTION_ADVISOR_BEAN_NAME));
}

#[test]
fn test_missing_annotation_is_a_configuration_error() {
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register(
        "appConfig",
        BeanDefinition::new("AppConfig")
            .with_import(Arc::new(TransactionManagementConfigurationSelector::new())),
    )
    .unwrap();

    let err = ctx.refresh().unwrap_err();
    match err {
        Error::MissingImportMetadata { annotation, class_name } => {
            assert_eq!(annotation, "EnableTransactionManagement");
            assert_eq!(class_name, "AppConfig");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_aspectj_mode_is_rejected() {
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register(
        "appConfig",
        app_config(EnableTransactionManagement::new().with_mode(AdviceMode::AspectJ)),
    )
    .unwrap();

    let err = ctx.refresh().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
    assert!(!ctx.factory().contains_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME));
}

#[test]
fn test_user_attribute_source_is_kept() {
    let manager = RecordingManager::new();
    let ctx = transactional_context(&manager);
    ctx.register(
        TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME,
        BeanDefinition::new("NameMatchTransactionAttributeSource").with_instance(|| {
            let source: Arc<dyn TransactionAttributeSource> = Arc::new(
                NameMatchTransactionAttributeSource::new()
                    .add_method("bal*", TransactionAttribute::default().read_only())
                    .unwrap(),
            );
            Bean::new(source)
        }),
    )
    .unwrap();
    ctx.refresh().unwrap();

    let definition = ctx
        .factory()
        .bean_definition(TRANSACTION_ATTRIBUTE_SOURCE_BEAN_NAME)
        .unwrap();
    assert_eq!(definition.type_name(), "NameMatchTransactionAttributeSource");
    assert_eq!(definition.role(), Role::Application);

    // only `balance` is transactional under the name-match source
    let proxy = proxy_of(&ctx, "payService");
    proxy
        .invoke("balance", |target| Ok(target.downcast::<PayService>().unwrap().balance()))
        .unwrap();
    proxy
        .invoke("pay", |target| target.downcast::<PayService>().unwrap().pay(5))
        .unwrap();
    assert_eq!(
        manager.entries(),
        vec!["begin PayService::balance", "commit PayService::balance"]
    );
}

#[test]
fn test_configurer_manager_takes_precedence() {
    let fallback = RecordingManager::new();
    let preferred = RecordingManager::new();
    let ctx = transactional_context(&fallback);
    ctx.register("txConfigurer", configurer_definition(&preferred))
        .unwrap();
    ctx.refresh().unwrap();

    proxy_of(&ctx, "payService")
        .invoke("pay", |target| target.downcast::<PayService>().unwrap().pay(3))
        .unwrap();

    assert!(fallback.entries().is_empty());
    assert_eq!(preferred.entries().len(), 2);
}

#[test]
fn test_missing_manager_fails_transactional_call() {
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register("appConfig", app_config(EnableTransactionManagement::new()))
        .unwrap();
    ctx.register("payService", pay_service_definition()).unwrap();
    ctx.refresh().unwrap();

    let interceptor = ctx
        .get_bean_as::<TransactionInterceptor>(TRANSACTION_INTERCEPTOR_BEAN_NAME)
        .unwrap();
    assert!(!interceptor.has_manager());

    let result = proxy_of(&ctx, "payService")
        .invoke("pay", |target| target.downcast::<PayService>().unwrap().pay(1));
    assert!(matches!(result, Err(Error::Processor { .. })));
}
