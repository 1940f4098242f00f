use std::collections::HashMap;
use std::sync::Arc;

use anvil_core::{
    Bean, BeanContext, BeanDefinition, BeanPostProcessor, MergedDefinitionPostProcessor, Result,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::events::EventMulticaster;

/// Registers singleton listener beans with the multicaster as they are created
pub struct ApplicationListenerDetector {
    multicaster: Arc<EventMulticaster>,
    /// Bean name to whether its definition is a singleton
    singleton_names: Mutex<HashMap<String, bool>>,
}

impl ApplicationListenerDetector {
    pub fn new(multicaster: Arc<EventMulticaster>) -> Self {
        Self {
            multicaster,
            singleton_names: Mutex::new(HashMap::new()),
        }
    }
}

impl BeanPostProcessor for ApplicationListenerDetector {
    fn post_process_after_initialization(&self, bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean> {
        let Some(listener) = bean.listener_view() else {
            return Ok(bean);
        };
        let singleton = self.singleton_names.lock().get(ctx.name).copied();
        match singleton {
            Some(true) => {
                if self.multicaster.add_listener(ctx.name, listener) {
                    debug!(listener = ctx.name, "Detected application listener");
                }
            }
            Some(false) => {
                warn!(
                    "Inner bean '{}' implements ApplicationListener interface but is not reachable for event multicasting by its containing ApplicationContext because it does not have singleton scope",
                    ctx.name
                );
                self.singleton_names.lock().remove(ctx.name);
            }
            // not created from a definition; picked up at refresh
            None => {}
        }
        Ok(bean)
    }

    fn as_merged_definition_processor(&self) -> Option<&dyn MergedDefinitionPostProcessor> {
        Some(self)
    }

    fn processor_name(&self) -> &str {
        "ApplicationListenerDetector"
    }
}

impl MergedDefinitionPostProcessor for ApplicationListenerDetector {
    fn post_process_merged_bean_definition(
        &self,
        definition: &BeanDefinition,
        bean_name: &str,
    ) -> Result<()> {
        self.singleton_names
            .lock()
            .insert(bean_name.to_string(), definition.is_singleton());
        Ok(())
    }
}
