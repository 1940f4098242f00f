//! Registry post-processor discovery tests
//!
//! Registry post-processors may register further registry post-processors.
//! These tests cover:
//! - Discovered processors running in the same phase
//! - The pass limit on runaway discovery
//! - Each bean name being invoked at most once

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anvil_core::{BeanDefinitionRegistry, BootstrapConfig, BootstrapEvent, Error, Phase};
use common::*;

#[test]
fn test_discovered_processor_runs_in_same_phase() {
    let fx = Fixture::new();
    let log = fx.log.clone();
    let spawn_e: RegistryHook = Arc::new(move |registry: &dyn BeanDefinitionRegistry| {
        registry.register_bean_definition("E", registry_processor("E", Tiering::Plain, &log))
    });
    fx.factory
        .register_bean_definition(
            "D",
            registry_processor_with_hook("D", Tiering::Plain, &fx.log, spawn_e),
        )
        .unwrap();

    fx.delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    assert_eq!(fx.log.labels_for("registry"), vec!["D", "E"]);
    assert_eq!(fx.log.labels_for("factory"), vec!["D", "E"]);

    let passes: Vec<(u32, Vec<String>)> = fx
        .observer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BootstrapEvent::DiscoveryPass { pass, discovered } => Some((pass, discovered)),
            _ => None,
        })
        .collect();
    assert_eq!(
        passes,
        vec![(1, vec!["D".to_string()]), (2, vec!["E".to_string()])]
    );
}

#[test]
fn test_priority_processor_may_register_ordered_one() {
    let fx = Fixture::new();
    let log = fx.log.clone();
    let spawn: RegistryHook = Arc::new(move |registry: &dyn BeanDefinitionRegistry| {
        registry.register_bean_definition("late", registry_processor("late", Tiering::Ordered(0), &log))
    });
    fx.factory
        .register_bean_definition(
            "early",
            registry_processor_with_hook("early", Tiering::Priority(0), &fx.log, spawn),
        )
        .unwrap();
    fx.factory
        .register_bean_definition("ordered", registry_processor("ordered", Tiering::Ordered(5), &fx.log))
        .unwrap();

    fx.delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    // the ordered wave is looked up again after the priority wave
    assert_eq!(fx.log.labels_for("registry"), vec!["early", "late", "ordered"]);
}

#[test]
fn test_priority_processor_registered_by_priority_one_precedes_ordered() {
    let fx = Fixture::new();
    let log = fx.log.clone();
    let spawn: RegistryHook = Arc::new(move |registry: &dyn BeanDefinitionRegistry| {
        registry.register_bean_definition(
            "latePrio",
            registry_processor("latePrio", Tiering::Priority(10), &log),
        )
    });
    fx.factory
        .register_bean_definition(
            "early",
            registry_processor_with_hook("early", Tiering::Priority(0), &fx.log, spawn),
        )
        .unwrap();
    fx.factory
        .register_bean_definition("ordered", registry_processor("ordered", Tiering::Ordered(5), &fx.log))
        .unwrap();

    fx.delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    // a lower order value does not let an ordered processor overtake a priority one
    assert_eq!(fx.log.labels_for("registry"), vec!["early", "latePrio", "ordered"]);
    assert_eq!(fx.log.count("latePrio:registry"), 1);
}

#[test]
fn test_runaway_discovery_hits_pass_limit() {
    let config = BootstrapConfig {
        max_discovery_passes: 3,
        ..BootstrapConfig::default()
    };
    let fx = Fixture::with_config(config);
    let counter = Arc::new(AtomicUsize::new(0));

    fn spawning(log: InvocationLog, counter: Arc<AtomicUsize>) -> RegistryHook {
        Arc::new(move |registry: &dyn BeanDefinitionRegistry| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let name = format!("gen{}", n);
            registry.register_bean_definition(
                &name,
                registry_processor_with_hook(
                    &name,
                    Tiering::Plain,
                    &log,
                    spawning(log.clone(), counter.clone()),
                ),
            )
        })
    }

    fx.factory
        .register_bean_definition(
            "gen0",
            registry_processor_with_hook(
                "gen0",
                Tiering::Plain,
                &fx.log,
                spawning(fx.log.clone(), counter.clone()),
            ),
        )
        .unwrap();

    let err = fx
        .delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap_err();

    match err {
        Error::DiscoveryLimitExceeded { passes, pending } => {
            assert_eq!(passes, 3);
            assert_eq!(pending, vec!["gen3".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // three passes ran before the limit was hit
    assert_eq!(fx.log.labels_for("registry"), vec!["gen0", "gen1", "gen2"]);
    assert!(fx.log.labels_for("factory").is_empty());
}

#[test]
fn test_no_processor_invoked_twice() {
    let fx = Fixture::new();
    let log = fx.log.clone();
    // re-registering an already processed name must not run it again
    let reregister: RegistryHook = Arc::new(move |registry: &dyn BeanDefinitionRegistry| {
        registry.register_bean_definition("A", registry_processor("A", Tiering::Priority(0), &log))
    });
    fx.factory
        .register_bean_definition("A", registry_processor("A", Tiering::Priority(0), &fx.log))
        .unwrap();
    fx.factory
        .register_bean_definition(
            "B",
            registry_processor_with_hook("B", Tiering::Plain, &fx.log, reregister),
        )
        .unwrap();

    let processed = fx
        .delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    assert_eq!(fx.log.count("A:registry"), 1);
    assert_eq!(fx.log.count("B:registry"), 1);
    assert_eq!(fx.log.count("A:factory"), 1);
    assert!(processed.contains("A"));
    assert!(processed.contains("B"));
}

#[test]
fn test_registry_processors_excluded_from_factory_tiers() {
    let fx = Fixture::new();
    fx.factory
        .register_bean_definition("reg", registry_processor("reg", Tiering::Plain, &fx.log))
        .unwrap();
    fx.factory
        .register_bean_definition("fac", factory_processor("fac", Tiering::Plain, &fx.log))
        .unwrap();

    fx.delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    assert_eq!(fx.log.entries(), vec!["reg:registry", "reg:factory", "fac:factory"]);
    assert_eq!(fx.observer.invoked(Phase::FactoryMutation), vec!["reg", "fac"]);
}

#[test]
fn test_phase_events_bracket_each_phase() {
    let fx = Fixture::new();
    fx.factory
        .register_bean_definition("reg", registry_processor("reg", Tiering::Ordered(1), &fx.log))
        .unwrap();

    fx.delegate
        .invoke_bean_factory_post_processors(&fx.factory, &[])
        .unwrap();

    let events = fx.observer.events();
    assert_eq!(
        events.first(),
        Some(&BootstrapEvent::PhaseStarted {
            phase: Phase::RegistryMutation
        })
    );
    assert!(events.contains(&BootstrapEvent::PhaseCompleted {
        phase: Phase::RegistryMutation,
        invoked: 1
    }));
    assert_eq!(
        events.last(),
        Some(&BootstrapEvent::PhaseCompleted {
            phase: Phase::FactoryMutation,
            invoked: 1
        })
    );
}
