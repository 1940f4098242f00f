//! Extension contracts
//!
//! Container extensions implement one or more of these traits. Which trait a
//! bean implements is recorded as a typed view on its [`Bean`] handle and as
//! [`Capabilities`](crate::Capabilities) on its definition.

use std::fmt;
use std::sync::Arc;

use crate::bean::Bean;
use crate::definition::BeanDefinition;
use crate::error::Result;
use crate::events::ApplicationEvent;
use crate::factory::{BeanContext, BeanDefinitionRegistry, ConfigurableBeanFactory};
use crate::metadata::AnnotationMetadata;

/// Alters already-registered bean definitions
pub trait FactoryPostProcessor: Send + Sync {
    fn post_process_bean_factory(&self, _factory: &dyn ConfigurableBeanFactory) -> Result<()> {
        Ok(())
    }
}

/// Adds or replaces bean definitions before any regular bean exists
///
/// Every registry post-processor is also run as a factory post-processor once
/// registry mutation has settled.
pub trait RegistryPostProcessor: FactoryPostProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()>;
}

/// Decorator invoked around the initialization of every bean
pub trait BeanPostProcessor: Send + Sync {
    /// Called before the bean's initialization; may replace the bean
    fn post_process_before_initialization(&self, bean: Bean, _ctx: &BeanContext<'_>) -> Result<Bean> {
        Ok(bean)
    }

    /// Called after the bean's initialization; may replace the bean
    fn post_process_after_initialization(&self, bean: Bean, _ctx: &BeanContext<'_>) -> Result<Bean> {
        Ok(bean)
    }

    /// Merged-definition facet, if this decorator has one
    fn as_merged_definition_processor(&self) -> Option<&dyn MergedDefinitionPostProcessor> {
        None
    }

    /// Name used in logs and bootstrap events
    fn processor_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Decorator that also inspects each merged definition before initialization
pub trait MergedDefinitionPostProcessor: BeanPostProcessor {
    fn post_process_merged_bean_definition(
        &self,
        definition: &BeanDefinition,
        bean_name: &str,
    ) -> Result<()>;
}

/// Receives application events from the multicaster
pub trait ApplicationListener: Send + Sync {
    fn on_application_event(&self, event: &ApplicationEvent) -> Result<()>;

    /// Whether this listener wants the event at all
    fn supports(&self, _event: &ApplicationEvent) -> bool {
        true
    }
}

/// Registers additional definitions on behalf of an importing configuration
pub trait ImportRegistrar: Send + Sync {
    fn register_bean_definitions(
        &self,
        importing: &AnnotationMetadata,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()>;

    fn name(&self) -> &str;
}

/// An already-instantiated extension handed to the bootstrap by its caller
///
/// These bypass the registry lookup entirely.
#[derive(Clone)]
pub enum SuppliedPostProcessor {
    Registry {
        label: String,
        processor: Arc<dyn RegistryPostProcessor>,
    },
    Factory {
        label: String,
        processor: Arc<dyn FactoryPostProcessor>,
    },
}

impl SuppliedPostProcessor {
    pub fn registry(label: impl Into<String>, processor: Arc<dyn RegistryPostProcessor>) -> Self {
        Self::Registry {
            label: label.into(),
            processor,
        }
    }

    pub fn factory(label: impl Into<String>, processor: Arc<dyn FactoryPostProcessor>) -> Self {
        Self::Factory {
            label: label.into(),
            processor,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Registry { label, .. } | Self::Factory { label, .. } => label,
        }
    }
}

impl fmt::Debug for SuppliedPostProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry { label, .. } => f.debug_tuple("Registry").field(label).finish(),
            Self::Factory { label, .. } => f.debug_tuple("Factory").field(label).finish(),
        }
    }
}
