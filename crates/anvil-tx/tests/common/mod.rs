//! Common test utilities for anvil-tx
//!
//! Provides a recording transaction manager, a small payment service with
//! transactional metadata and definition builders wiring them into a context.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Arc;

use anvil_context::ApplicationContext;
use anvil_core::{
    AnnotationAttributes, AttributeValue, Bean, BeanDefinition, BootstrapConfig, Error,
    MethodDescriptor, Result, Role, TypeDescriptor, TypeMarkers,
};
use anvil_tx::{
    configurer_bean, transaction_manager_bean, EnableTransactionManagement,
    PlatformTransactionManager, TransactionAttribute, TransactionManagementConfigurer,
    TransactionStatus, PLATFORM_TRANSACTION_MANAGER, TRANSACTIONAL,
    TRANSACTION_MANAGEMENT_CONFIGURER,
};
use parking_lot::Mutex;

/// Transaction manager that journals begin/commit/rollback calls
#[derive(Default)]
pub struct RecordingManager {
    entries: Mutex<Vec<String>>,
}

impl RecordingManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl PlatformTransactionManager for RecordingManager {
    fn begin(&self, attribute: &TransactionAttribute, name: &str) -> Result<TransactionStatus> {
        self.entries.lock().push(format!("begin {}", name));
        Ok(TransactionStatus::new(name, attribute))
    }

    fn commit(&self, status: TransactionStatus) -> Result<()> {
        self.entries.lock().push(format!("commit {}", status.name));
        Ok(())
    }

    fn rollback(&self, status: TransactionStatus) -> Result<()> {
        self.entries.lock().push(format!("rollback {}", status.name));
        Ok(())
    }
}

/// Configurer handing out a fixed manager
pub struct FixedConfigurer(pub Arc<RecordingManager>);

impl TransactionManagementConfigurer for FixedConfigurer {
    fn annotation_driven_transaction_manager(&self) -> Arc<dyn PlatformTransactionManager> {
        self.0.clone()
    }
}

/// Payment service whose `pay` and `notify` methods are transactional
#[derive(Default)]
pub struct PayService {
    paid: Mutex<Vec<u32>>,
}

impl PayService {
    pub fn pay(&self, amount: u32) -> Result<u32> {
        if amount == 0 {
            return Err(Error::processor("PayService", "declined: zero amount"));
        }
        self.paid.lock().push(amount);
        Ok(amount)
    }

    pub fn notify(&self) -> Result<()> {
        Err(Error::processor("PayService", "mailer offline"))
    }

    pub fn balance(&self) -> u32 {
        self.paid.lock().iter().sum()
    }
}

pub fn pay_service_descriptor() -> TypeDescriptor {
    TypeDescriptor::new("PayService")
        .with_method_descriptor(
            MethodDescriptor::new("PayService", "pay")
                .with_annotation(TRANSACTIONAL, AnnotationAttributes::new()),
        )
        .with_method_descriptor(MethodDescriptor::new("PayService", "notify").with_annotation(
            TRANSACTIONAL,
            AnnotationAttributes::new()
                .with("noRollbackFor", AttributeValue::List(vec!["Processor".to_string()])),
        ))
        .with_method("balance")
}

pub fn pay_service_definition() -> BeanDefinition {
    BeanDefinition::new("PayService")
        .with_instance(|| Bean::new(PayService::default()).with_descriptor(pay_service_descriptor()))
}

/// Service without any transactional metadata
pub struct ReportService;

pub fn report_service_definition() -> BeanDefinition {
    BeanDefinition::new("ReportService").with_instance(|| {
        Bean::new(ReportService)
            .with_descriptor(TypeDescriptor::new("ReportService").with_method("render"))
    })
}

/// Transactional service that already is a container proxy
pub fn proxied_service_definition() -> BeanDefinition {
    BeanDefinition::new("PayService").with_instance(|| {
        Bean::new(PayService::default())
            .with_descriptor(pay_service_descriptor().with_markers(TypeMarkers::PROXY))
    })
}

pub fn manager_definition(manager: &Arc<RecordingManager>) -> BeanDefinition {
    let manager = manager.clone();
    BeanDefinition::new("RecordingManager")
        .implementing(PLATFORM_TRANSACTION_MANAGER)
        .with_instance(move || {
            let manager: Arc<dyn PlatformTransactionManager> = manager.clone();
            transaction_manager_bean(manager)
        })
}

pub fn configurer_definition(manager: &Arc<RecordingManager>) -> BeanDefinition {
    let manager = manager.clone();
    BeanDefinition::new("FixedConfigurer")
        .implementing(TRANSACTION_MANAGEMENT_CONFIGURER)
        .with_instance(move || {
            let configurer: Arc<dyn TransactionManagementConfigurer> =
                Arc::new(FixedConfigurer(manager.clone()));
            configurer_bean(configurer)
        })
}

/// Configuration type carrying the enabling annotation
pub struct AppConfig;

pub fn app_config(enable: EnableTransactionManagement) -> BeanDefinition {
    enable.apply(BeanDefinition::new("AppConfig").with_instance(|| Bean::new(AppConfig)))
}

/// Context with transaction management, a recording manager and the payment service
pub fn transactional_context(manager: &Arc<RecordingManager>) -> ApplicationContext {
    let ctx = ApplicationContext::new(BootstrapConfig::default()).unwrap();
    ctx.register("appConfig", app_config(EnableTransactionManagement::new()))
        .unwrap();
    ctx.register("transactionManager", manager_definition(manager))
        .unwrap();
    ctx.register("payService", pay_service_definition()).unwrap();
    ctx
}
