use std::collections::HashSet;
use std::sync::Arc;

use anvil_core::{
    BeanPostProcessor, BootstrapEvent, Capabilities, ConfigurableBeanFactory, Error, Ordered,
    Phase, Result, Tier,
};
use tracing::{info, warn};

use super::{PostProcessorChecker, PostProcessorDelegate, Resolved};
use crate::classify::classify;

pub(super) fn run(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    detector: Arc<dyn BeanPostProcessor>,
) -> Result<usize> {
    delegate.emit(BootstrapEvent::PhaseStarted {
        phase: Phase::DecoratorRegistration,
    });

    let names = factory.bean_names_for_capability(Capabilities::BEAN_POST_PROCESSOR);
    let target = factory.bean_post_processor_count() + 1 + names.len();

    let mut checker = PostProcessorChecker::new(target, delegate.observer().clone());
    if !delegate.report_early_beans {
        checker = checker.silenced();
    }
    install(delegate, factory, "PostProcessorChecker", Arc::new(checker), None);

    let tiers = classify(factory, &names, &HashSet::new());
    let mut internal = Vec::new();

    let mut priority = resolve(factory, &tiers.priority, Tier::Priority, &mut internal)?;
    delegate.sort(factory, &mut priority);
    install_all(delegate, factory, priority);

    let mut ordered = resolve(factory, &tiers.ordered, Tier::Ordered, &mut internal)?;
    delegate.sort(factory, &mut ordered);
    install_all(delegate, factory, ordered);

    // Plain decorators keep lookup order
    let plain = resolve(factory, &tiers.plain, Tier::Plain, &mut internal)?;
    install_all(delegate, factory, plain);

    // Merged-definition decorators move behind everything else
    delegate.sort(factory, &mut internal);
    for resolved in internal {
        install(
            delegate,
            factory,
            &resolved.name,
            resolved.processor,
            Some(Tier::Internal),
        );
    }

    // Listener detection always runs last
    let detector_name = detector.processor_name().to_string();
    install(delegate, factory, &detector_name, detector, None);

    let installed = factory.bean_post_processor_count();
    if installed != target {
        warn!(installed, target, "Installed bean post-processor count differs from target");
    }
    info!(installed, looked_up = names.len(), "Bean post-processors registered");
    delegate.emit(BootstrapEvent::PhaseCompleted {
        phase: Phase::DecoratorRegistration,
        invoked: names.len(),
    });
    Ok(installed)
}

/// Instantiate one tier, collecting merged-definition decorators into `internal`
fn resolve(
    factory: &dyn ConfigurableBeanFactory,
    names: &[String],
    tier: Tier,
    internal: &mut Vec<Resolved<dyn BeanPostProcessor>>,
) -> Result<Vec<Resolved<dyn BeanPostProcessor>>> {
    let mut wave = Vec::with_capacity(names.len());
    for name in names {
        let bean = factory.get_bean_with(name, Capabilities::BEAN_POST_PROCESSOR)?;
        let processor = bean.bean_post_processor_view().ok_or_else(|| {
            Error::not_of_required_capability(name.as_str(), Capabilities::BEAN_POST_PROCESSOR)
        })?;
        let resolved = Resolved {
            name: name.clone(),
            tier: Some(tier),
            order: bean.order(),
            processor,
        };
        if resolved.processor.as_merged_definition_processor().is_some() {
            internal.push(resolved.clone());
        }
        wave.push(resolved);
    }
    Ok(wave)
}

fn install_all(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    wave: Vec<Resolved<dyn BeanPostProcessor>>,
) {
    for resolved in wave {
        install(delegate, factory, &resolved.name, resolved.processor, resolved.tier);
    }
}

fn install(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    name: &str,
    processor: Arc<dyn BeanPostProcessor>,
    tier: Option<Tier>,
) {
    factory.add_bean_post_processor(processor);
    delegate.emit(BootstrapEvent::DecoratorInstalled {
        name: name.to_string(),
        tier,
        position: factory.bean_post_processor_count(),
    });
}
