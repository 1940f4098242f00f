//! Definition builders and fixtures

#![allow(dead_code)]

use std::sync::Arc;

use anvil_context::{DefaultListableBeanFactory, PostProcessorDelegate};
use anvil_core::{
    Bean, BeanDefinition, BootstrapConfig, Capabilities, RecordingObserver, Role,
};

use super::mocks::*;

/// Ordering markers a test extension declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiering {
    Priority(i32),
    Ordered(i32),
    Plain,
}

impl Tiering {
    pub fn apply(self, definition: BeanDefinition) -> BeanDefinition {
        match self {
            Tiering::Priority(order) => definition.with_priority_order(order),
            Tiering::Ordered(order) => definition.with_order(order),
            Tiering::Plain => definition,
        }
    }

    /// Rank across tiers: lower runs first
    pub fn rank(self) -> u8 {
        match self {
            Tiering::Priority(_) => 0,
            Tiering::Ordered(_) => 1,
            Tiering::Plain => 2,
        }
    }
}

/// Registry post-processor definition that logs to `log`
pub fn registry_processor(label: &str, tiering: Tiering, log: &InvocationLog) -> BeanDefinition {
    let label = label.to_string();
    let log = log.clone();
    tiering.apply(
        BeanDefinition::new("RecordingRegistryProcessor")
            .with_capabilities(Capabilities::REGISTRY_POST_PROCESSOR)
            .with_instance(move || {
                Bean::registry_post_processor(RecordingRegistryProcessor::new(&label, &log))
            }),
    )
}

/// Registry post-processor definition that also runs `hook` against the registry
pub fn registry_processor_with_hook(
    label: &str,
    tiering: Tiering,
    log: &InvocationLog,
    hook: RegistryHook,
) -> BeanDefinition {
    let label = label.to_string();
    let log = log.clone();
    tiering.apply(
        BeanDefinition::new("RecordingRegistryProcessor")
            .with_capabilities(Capabilities::REGISTRY_POST_PROCESSOR)
            .with_instance(move || {
                Bean::registry_post_processor(
                    RecordingRegistryProcessor::new(&label, &log).with_hook(hook.clone()),
                )
            }),
    )
}

/// Factory post-processor definition that logs to `log`
pub fn factory_processor(label: &str, tiering: Tiering, log: &InvocationLog) -> BeanDefinition {
    let label = label.to_string();
    let log = log.clone();
    tiering.apply(
        BeanDefinition::new("RecordingFactoryProcessor")
            .with_capabilities(Capabilities::FACTORY_POST_PROCESSOR)
            .with_instance(move || {
                Bean::factory_post_processor(RecordingFactoryProcessor::new(&label, &log))
            }),
    )
}

/// Decorator definition that logs to `log`
pub fn decorator(label: &str, tiering: Tiering, log: &InvocationLog) -> BeanDefinition {
    let label = label.to_string();
    let log = log.clone();
    tiering.apply(
        BeanDefinition::new("RecordingDecorator")
            .with_capabilities(Capabilities::BEAN_POST_PROCESSOR)
            .with_instance(move || Bean::bean_post_processor(RecordingDecorator::new(&label, &log))),
    )
}

/// Decorator definition with a merged-definition facet
pub fn merged_decorator(label: &str, tiering: Tiering, log: &InvocationLog) -> BeanDefinition {
    let label = label.to_string();
    let log = log.clone();
    tiering.apply(
        BeanDefinition::new("MergedRecordingDecorator")
            .with_capabilities(Capabilities::MERGED_DEFINITION)
            .with_instance(move || {
                Bean::bean_post_processor(MergedRecordingDecorator::new(&label, &log))
            }),
    )
}

/// Plain application bean definition
pub fn service(type_name: &str) -> BeanDefinition {
    BeanDefinition::new(type_name).with_instance(|| Bean::new(Service::default()))
}

/// Infrastructure-role bean definition
pub fn infrastructure(type_name: &str) -> BeanDefinition {
    service(type_name).with_role(Role::Infrastructure)
}

/// Factory, recording observer and delegate sharing one configuration
pub struct Fixture {
    pub factory: DefaultListableBeanFactory,
    pub observer: Arc<RecordingObserver>,
    pub delegate: PostProcessorDelegate,
    pub log: InvocationLog,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(BootstrapConfig::default())
    }

    pub fn with_config(config: BootstrapConfig) -> Self {
        let observer = Arc::new(RecordingObserver::new());
        let delegate = PostProcessorDelegate::new(&config).with_observer(observer.clone());
        Self {
            factory: DefaultListableBeanFactory::new(),
            observer,
            delegate,
            log: InvocationLog::new(),
        }
    }
}
