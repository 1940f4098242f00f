use std::collections::HashSet;

use anvil_core::{
    BeanDefinitionRegistry, BootstrapEvent, Capabilities, ConfigurableBeanFactory, Error,
    FactoryPostProcessor, Ordered, Phase, RegistryPostProcessor, Result, SuppliedPostProcessor,
    Tier,
};
use tracing::{debug, info};

use super::{PostProcessorDelegate, Resolved};
use crate::classify::classify;

/// State handed from the registry phase to the factory phase
pub(super) struct Settled {
    /// Bean names already invoked as registry post-processors
    pub processed: HashSet<String>,
    /// Every registry post-processor invoked, in invocation order
    pub registry_processors: Vec<Resolved<dyn RegistryPostProcessor>>,
    /// Caller-supplied plain factory post-processors
    pub regular: Vec<Resolved<dyn FactoryPostProcessor>>,
}

pub(super) fn run(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    supplied: &[SuppliedPostProcessor],
) -> Result<Settled> {
    delegate.emit(BootstrapEvent::PhaseStarted {
        phase: Phase::RegistryMutation,
    });
    let registry: &dyn BeanDefinitionRegistry = factory;

    let mut settled = Settled {
        processed: HashSet::new(),
        registry_processors: Vec::new(),
        regular: Vec::new(),
    };

    // Supplied processors bypass lookup and run first
    for processor in supplied {
        match processor {
            SuppliedPostProcessor::Registry { label, processor } => {
                delegate.invoked(Phase::RegistryMutation, label, None);
                processor.post_process_bean_definition_registry(registry)?;
                settled.registry_processors.push(Resolved {
                    name: label.clone(),
                    tier: None,
                    order: None,
                    processor: processor.clone(),
                });
            }
            SuppliedPostProcessor::Factory { label, processor } => {
                settled.regular.push(Resolved {
                    name: label.clone(),
                    tier: None,
                    order: None,
                    processor: processor.clone(),
                });
            }
        }
    }
    let supplied_count = settled.registry_processors.len();

    // Priority tier
    let names = factory.bean_names_for_capability(Capabilities::REGISTRY_POST_PROCESSOR);
    let tiers = classify(factory, &names, &settled.processed);
    let wave = resolve(factory, &tiers.priority, Tier::Priority, &mut settled.processed)?;
    invoke_wave(delegate, factory, wave, &mut settled)?;

    // Ordered tier; the set may have grown, and priority processors registered
    // by the first wave still run ahead of every ordered one
    let names = factory.bean_names_for_capability(Capabilities::REGISTRY_POST_PROCESSOR);
    let tiers = classify(factory, &names, &settled.processed);
    let late_priority = resolve(factory, &tiers.priority, Tier::Priority, &mut settled.processed)?;
    let ordered = resolve(factory, &tiers.ordered, Tier::Ordered, &mut settled.processed)?;
    invoke_wave(delegate, factory, late_priority, &mut settled)?;
    invoke_wave(delegate, factory, ordered, &mut settled)?;

    // Everything else, until a pass discovers nothing new
    let mut pass = 0u32;
    loop {
        let names = factory.bean_names_for_capability(Capabilities::REGISTRY_POST_PROCESSOR);
        let tiers = classify(factory, &names, &settled.processed);
        if tiers.is_empty() {
            break;
        }
        pass += 1;
        if pass > delegate.max_discovery_passes {
            return Err(Error::discovery_limit_exceeded(
                delegate.max_discovery_passes,
                tiers.pending_names(),
            ));
        }
        delegate.emit(BootstrapEvent::DiscoveryPass {
            pass,
            discovered: tiers.pending_names(),
        });

        let mut wave = Vec::with_capacity(tiers.len());
        for (name, tier) in &tiers.pending {
            settled.processed.insert(name.clone());
            wave.push(resolve_one(factory, name, *tier)?);
        }
        invoke_wave(delegate, factory, wave, &mut settled)?;
    }

    let invoked = settled.registry_processors.len();
    debug!(
        supplied = supplied_count,
        discovered = invoked - supplied_count,
        passes = pass,
        "Registry post-processors settled"
    );
    info!(invoked, "Registry mutation complete");
    delegate.emit(BootstrapEvent::PhaseCompleted {
        phase: Phase::RegistryMutation,
        invoked,
    });
    Ok(settled)
}

/// Instantiate one tier and mark it processed
fn resolve(
    factory: &dyn ConfigurableBeanFactory,
    names: &[String],
    tier: Tier,
    processed: &mut HashSet<String>,
) -> Result<Vec<Resolved<dyn RegistryPostProcessor>>> {
    let mut wave = Vec::with_capacity(names.len());
    for name in names {
        processed.insert(name.clone());
        wave.push(resolve_one(factory, name, tier)?);
    }
    Ok(wave)
}

fn resolve_one(
    factory: &dyn ConfigurableBeanFactory,
    name: &str,
    tier: Tier,
) -> Result<Resolved<dyn RegistryPostProcessor>> {
    let bean = factory.get_bean_with(name, Capabilities::REGISTRY_POST_PROCESSOR)?;
    let processor = bean.registry_post_processor_view().ok_or_else(|| {
        Error::not_of_required_capability(name, Capabilities::REGISTRY_POST_PROCESSOR)
    })?;
    Ok(Resolved {
        name: name.to_string(),
        tier: Some(tier),
        order: bean.order(),
        processor,
    })
}

/// Sort a wave and run its registry hooks
fn invoke_wave(
    delegate: &PostProcessorDelegate,
    factory: &dyn ConfigurableBeanFactory,
    mut wave: Vec<Resolved<dyn RegistryPostProcessor>>,
    settled: &mut Settled,
) -> Result<()> {
    delegate.sort(factory, &mut wave);
    for resolved in wave {
        delegate.invoked(Phase::RegistryMutation, &resolved.name, resolved.tier);
        resolved
            .processor
            .post_process_bean_definition_registry(factory)?;
        settled.registry_processors.push(resolved);
    }
    Ok(())
}
