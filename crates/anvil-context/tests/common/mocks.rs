//! Recording extensions
//!
//! Each mock appends `label:hook` entries to a shared [`InvocationLog`] so
//! tests can assert the exact invocation order across phases.

#![allow(dead_code)]

use std::sync::Arc;

use anvil_core::{
    ApplicationEvent, ApplicationListener, Bean, BeanContext, BeanDefinition,
    BeanDefinitionRegistry, BeanPostProcessor, ConfigurableBeanFactory, FactoryPostProcessor,
    MergedDefinitionPostProcessor, RegistryPostProcessor, Result,
};
use parking_lot::Mutex;

/// Shared, ordered record of hook invocations
#[derive(Clone, Default)]
pub struct InvocationLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Labels of entries recorded for `hook`, in order
    pub fn labels_for(&self, hook: &str) -> Vec<String> {
        let suffix = format!(":{}", hook);
        self.entries
            .lock()
            .iter()
            .filter_map(|e| e.strip_suffix(&suffix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }
}

pub type RegistryHook = Arc<dyn Fn(&dyn BeanDefinitionRegistry) -> Result<()> + Send + Sync>;

/// Registry post-processor that logs both hooks and optionally mutates the registry
pub struct RecordingRegistryProcessor {
    pub label: String,
    pub log: InvocationLog,
    pub on_registry: Option<RegistryHook>,
}

impl RecordingRegistryProcessor {
    pub fn new(label: &str, log: &InvocationLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            on_registry: None,
        }
    }

    pub fn with_hook(mut self, hook: RegistryHook) -> Self {
        self.on_registry = Some(hook);
        self
    }
}

impl FactoryPostProcessor for RecordingRegistryProcessor {
    fn post_process_bean_factory(&self, _factory: &dyn ConfigurableBeanFactory) -> Result<()> {
        self.log.record(format!("{}:factory", self.label));
        Ok(())
    }
}

impl RegistryPostProcessor for RecordingRegistryProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()> {
        self.log.record(format!("{}:registry", self.label));
        match &self.on_registry {
            Some(hook) => hook(registry),
            None => Ok(()),
        }
    }
}

/// Factory post-processor that logs its invocation
pub struct RecordingFactoryProcessor {
    pub label: String,
    pub log: InvocationLog,
}

impl RecordingFactoryProcessor {
    pub fn new(label: &str, log: &InvocationLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
        }
    }
}

impl FactoryPostProcessor for RecordingFactoryProcessor {
    fn post_process_bean_factory(&self, _factory: &dyn ConfigurableBeanFactory) -> Result<()> {
        self.log.record(format!("{}:factory", self.label));
        Ok(())
    }
}

/// Decorator that logs `label:before:<bean>` and `label:after:<bean>`
pub struct RecordingDecorator {
    pub label: String,
    pub log: InvocationLog,
}

impl RecordingDecorator {
    pub fn new(label: &str, log: &InvocationLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
        }
    }
}

impl BeanPostProcessor for RecordingDecorator {
    fn post_process_before_initialization(&self, bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean> {
        self.log.record(format!("{}:before:{}", self.label, ctx.name));
        Ok(bean)
    }

    fn post_process_after_initialization(&self, bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean> {
        self.log.record(format!("{}:after:{}", self.label, ctx.name));
        Ok(bean)
    }

    fn processor_name(&self) -> &str {
        &self.label
    }
}

/// Decorator with a merged-definition facet
pub struct MergedRecordingDecorator {
    pub label: String,
    pub log: InvocationLog,
}

impl MergedRecordingDecorator {
    pub fn new(label: &str, log: &InvocationLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
        }
    }
}

impl BeanPostProcessor for MergedRecordingDecorator {
    fn as_merged_definition_processor(&self) -> Option<&dyn MergedDefinitionPostProcessor> {
        Some(self)
    }

    fn processor_name(&self) -> &str {
        &self.label
    }
}

impl MergedDefinitionPostProcessor for MergedRecordingDecorator {
    fn post_process_merged_bean_definition(
        &self,
        _definition: &BeanDefinition,
        bean_name: &str,
    ) -> Result<()> {
        self.log.record(format!("{}:merged:{}", self.label, bean_name));
        Ok(())
    }
}

/// Listener that records every event it receives
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<ApplicationEvent>>,
}

impl ApplicationListener for RecordingListener {
    fn on_application_event(&self, event: &ApplicationEvent) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Plain application bean
#[derive(Debug, Default)]
pub struct Service {
    pub url: String,
}
