//! Post-processor bootstrap pipeline
//!
//! Container start-up runs three phases in a fixed sequence:
//!
//! 1. **Registry mutation** ([`registry_phase`]): registry post-processors may
//!    add definitions, including new registry post-processors, which are
//!    discovered by repeated passes until none are pending.
//! 2. **Factory mutation** ([`factory_phase`]): every registry post-processor
//!    runs again as a factory post-processor, then the remaining factory
//!    post-processors run tier by tier.
//! 3. **Decorator registration** ([`decorator_phase`]): bean post-processors
//!    are installed tier by tier behind a guard that reports beans created
//!    too early.
//!
//! Inside every phase the tiers run Priority, then Ordered, then Plain, and
//! each tier is sorted with the factory's comparator.

mod checker;
mod decorator_phase;
mod factory_phase;
mod registry_phase;

pub use checker::PostProcessorChecker;

use std::collections::HashSet;
use std::sync::Arc;

use anvil_core::{
    sort_processors, BeanPostProcessor, BootstrapConfig, BootstrapEvent, BootstrapObserver,
    ConfigurableBeanFactory, Ordered, Phase, Result, SuppliedPostProcessor, Tier,
    TracingObserver,
};

/// A processor instance resolved for one invocation wave
pub(crate) struct Resolved<P: ?Sized> {
    pub name: String,
    /// `None` for caller-supplied processors
    pub tier: Option<Tier>,
    pub order: Option<i32>,
    pub processor: Arc<P>,
}

impl<P: ?Sized> Clone for Resolved<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tier: self.tier,
            order: self.order,
            processor: self.processor.clone(),
        }
    }
}

impl<P: ?Sized> Ordered for Resolved<P> {
    fn order(&self) -> Option<i32> {
        self.order
    }
}

/// Runs the bootstrap phases against a factory
pub struct PostProcessorDelegate {
    observer: Arc<dyn BootstrapObserver>,
    max_discovery_passes: u32,
    report_early_beans: bool,
}

impl PostProcessorDelegate {
    pub fn new(config: &BootstrapConfig) -> Self {
        Self {
            observer: Arc::new(TracingObserver),
            max_discovery_passes: config.max_discovery_passes,
            report_early_beans: config.report_early_beans,
        }
    }

    /// Replace the observer receiving bootstrap events
    pub fn with_observer(mut self, observer: Arc<dyn BootstrapObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn observer(&self) -> &Arc<dyn BootstrapObserver> {
        &self.observer
    }

    /// Run the registry-mutation and factory-mutation phases
    ///
    /// Returns every bean name invoked as a post-processor.
    pub fn invoke_bean_factory_post_processors(
        &self,
        factory: &dyn ConfigurableBeanFactory,
        supplied: &[SuppliedPostProcessor],
    ) -> Result<HashSet<String>> {
        let settled = registry_phase::run(self, factory, supplied)?;
        factory_phase::run(self, factory, settled)
    }

    /// Run the decorator-registration phase
    ///
    /// `detector` is re-installed last. Returns the installed decorator count.
    pub fn register_bean_post_processors(
        &self,
        factory: &dyn ConfigurableBeanFactory,
        detector: Arc<dyn BeanPostProcessor>,
    ) -> Result<usize> {
        decorator_phase::run(self, factory, detector)
    }

    pub(crate) fn emit(&self, event: BootstrapEvent) {
        self.observer.on_event(&event);
    }

    pub(crate) fn sort<P: ?Sized>(
        &self,
        factory: &dyn ConfigurableBeanFactory,
        items: &mut [Resolved<P>],
    ) {
        let comparator = factory.dependency_comparator();
        sort_processors(items, comparator.as_deref());
    }

    pub(crate) fn invoked(&self, phase: Phase, name: &str, tier: Option<Tier>) {
        self.emit(BootstrapEvent::PostProcessorInvoked {
            phase,
            name: name.to_string(),
            tier,
        });
    }
}
