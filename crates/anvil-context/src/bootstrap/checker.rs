use std::sync::Arc;

use anvil_core::{Bean, BeanContext, BeanPostProcessor, BootstrapEvent, BootstrapObserver, Result};
use tracing::info;

use crate::factory::is_infrastructure;

/// Guard installed ahead of every looked-up decorator
///
/// Reports a bean created while fewer than `target` decorators are
/// installed: such a bean missed some of them. Decorators themselves and
/// infrastructure beans are expected to be created early and are not reported.
pub struct PostProcessorChecker {
    target: usize,
    observer: Arc<dyn BootstrapObserver>,
    enabled: bool,
}

impl PostProcessorChecker {
    pub fn new(target: usize, observer: Arc<dyn BootstrapObserver>) -> Self {
        Self {
            target,
            observer,
            enabled: true,
        }
    }

    /// Keep the guard installed but stop reporting
    pub fn silenced(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn target(&self) -> usize {
        self.target
    }
}

impl BeanPostProcessor for PostProcessorChecker {
    fn post_process_after_initialization(&self, bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean> {
        if !self.enabled || bean.is_bean_post_processor() || is_infrastructure(ctx.factory, ctx.name)
        {
            return Ok(bean);
        }
        let installed = ctx.factory.bean_post_processor_count();
        if installed < self.target {
            let type_name = ctx
                .factory
                .merged_bean_definition(ctx.name)
                .map(|def| def.type_name().to_string())
                .ok()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| bean.type_name().to_string());
            info!(
                "Bean '{}' of type [{}] is not eligible for getting processed by all bean post-processors (for example: not eligible for auto-proxying)",
                ctx.name, type_name
            );
            self.observer.on_event(&BootstrapEvent::EarlyBeanCreated {
                name: ctx.name.to_string(),
                type_name,
                installed,
                target: self.target,
            });
        }
        Ok(bean)
    }

    fn processor_name(&self) -> &str {
        "PostProcessorChecker"
    }
}
