//! Import processing for configuration definitions
//!
//! A definition carrying import registrars is a configuration: each registrar
//! runs against the registry with the definition's annotation metadata.
//! Definitions registered that way are processed in turn.

use std::collections::{HashSet, VecDeque};

use anvil_core::{
    AnnotationMetadata, BeanDefinition, BeanDefinitionRegistry, Capabilities,
    FactoryPostProcessor, RegistryPostProcessor, Result, Role, LOWEST_PRECEDENCE,
};
use parking_lot::Mutex;
use tracing::{debug, trace};

/// Bean name the context registers the processor under
pub const CONFIGURATION_PROCESSOR_BEAN_NAME: &str = "anvil.internalConfigurationProcessor";

/// Registry post-processor that runs import registrars
#[derive(Debug, Default)]
pub struct ConfigurationProcessor {
    /// Configurations already processed across invocations
    processed: Mutex<HashSet<String>>,
}

impl ConfigurationProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Infrastructure definition for registering the processor as a bean
    pub fn definition() -> BeanDefinition {
        BeanDefinition::new("ConfigurationProcessor")
            .with_role(Role::Infrastructure)
            .with_capabilities(Capabilities::REGISTRY_POST_PROCESSOR)
            .with_priority_order(LOWEST_PRECEDENCE)
            .with_instance(|| anvil_core::Bean::registry_post_processor(ConfigurationProcessor::new()))
    }

    fn process(&self, name: &str, registry: &dyn BeanDefinitionRegistry) -> Result<usize> {
        let definition = registry.bean_definition(name)?;
        if definition.imports().is_empty() {
            return Ok(0);
        }
        let metadata = definition
            .metadata()
            .cloned()
            .unwrap_or_else(|| AnnotationMetadata::new(definition.type_name()));

        for registrar in definition.imports() {
            trace!(configuration = name, registrar = registrar.name(), "Running import registrar");
            registrar.register_bean_definitions(&metadata, registry)?;
        }
        Ok(definition.imports().len())
    }
}

impl RegistryPostProcessor for ConfigurationProcessor {
    fn post_process_bean_definition_registry(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()> {
        let mut queue: VecDeque<String> = registry.bean_definition_names().into();
        let mut known: HashSet<String> = queue.iter().cloned().collect();
        let mut registrars = 0;

        while let Some(name) = queue.pop_front() {
            if !self.processed.lock().insert(name.clone()) {
                continue;
            }
            // the definition may have been removed by an earlier registrar
            if !registry.contains_bean_definition(&name) {
                continue;
            }
            registrars += self.process(&name, registry)?;

            for added in registry.bean_definition_names() {
                if known.insert(added.clone()) {
                    queue.push_back(added);
                }
            }
        }

        debug!(registrars, definitions = known.len(), "Processed configuration imports");
        Ok(())
    }
}

impl FactoryPostProcessor for ConfigurationProcessor {}
