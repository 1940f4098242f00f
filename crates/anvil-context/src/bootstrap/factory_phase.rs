use std::collections::HashSet;

use anvil_core::{
    BootstrapEvent, Capabilities, ConfigurableBeanFactory, Error, FactoryPostProcessor, Ordered,
    Phase, Result, Tier,
};
use tracing::{debug, info};

use super::registry_phase::Settled;
use super::{PostProcessorDelegate, Resolved};
use crate::classify::classify;

pub(super) fn run(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    settled: Settled,
) -> Result<HashSet<String>> {
    delegate.emit(BootstrapEvent::PhaseStarted {
        phase: Phase::FactoryMutation,
    });
    let Settled {
        mut processed,
        registry_processors,
        regular,
    } = settled;
    let mut invoked = 0;

    // Registry post-processors run again with their factory hook, then the
    // supplied plain ones
    for resolved in &registry_processors {
        delegate.invoked(Phase::FactoryMutation, &resolved.name, resolved.tier);
        resolved.processor.post_process_bean_factory(factory)?;
        invoked += 1;
    }
    for resolved in &regular {
        delegate.invoked(Phase::FactoryMutation, &resolved.name, resolved.tier);
        resolved.processor.post_process_bean_factory(factory)?;
        invoked += 1;
    }

    // One lookup; factory post-processors do not register new ones
    let names = factory.bean_names_for_capability(Capabilities::FACTORY_POST_PROCESSOR);
    let tiers = classify(factory, &names, &processed);
    debug!(
        priority = tiers.priority.len(),
        ordered = tiers.ordered.len(),
        plain = tiers.plain.len(),
        "Classified factory post-processors"
    );
    processed.extend(tiers.pending_names());

    // Each tier is instantiated only once the previous one has run
    for (tier, names) in [
        (Tier::Priority, &tiers.priority),
        (Tier::Ordered, &tiers.ordered),
        (Tier::Plain, &tiers.plain),
    ] {
        let mut wave = resolve(factory, names, tier)?;
        delegate.sort(factory, &mut wave);
        for resolved in &wave {
            delegate.invoked(Phase::FactoryMutation, &resolved.name, resolved.tier);
            resolved.processor.post_process_bean_factory(factory)?;
            invoked += 1;
        }
    }

    // Definitions may have been rewritten
    factory.clear_metadata_cache();

    info!(invoked, "Factory mutation complete");
    delegate.emit(BootstrapEvent::PhaseCompleted {
        phase: Phase::FactoryMutation,
        invoked,
    });
    Ok(processed)
}

fn resolve(
    factory: &dyn ConfigurableBeanFactory,
    names: &[String],
    tier: Tier,
) -> Result<Vec<Resolved<dyn FactoryPostProcessor>>> {
    names
        .iter()
        .map(|name| {
            let bean = factory.get_bean_with(name, Capabilities::FACTORY_POST_PROCESSOR)?;
            let processor = bean.factory_post_processor_view().ok_or_else(|| {
                Error::not_of_required_capability(name.as_str(), Capabilities::FACTORY_POST_PROCESSOR)
            })?;
            Ok(Resolved {
                name: name.clone(),
                tier: Some(tier),
                order: bean.order(),
                processor,
            })
        })
        .collect()
}
