//! Processor classification into priority tiers

use std::collections::HashSet;

use anvil_core::{Capabilities, ConfigurableBeanFactory, Tier};

/// Unprocessed processor names split by tier, each in lookup order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tiers {
    pub priority: Vec<String>,
    pub ordered: Vec<String>,
    pub plain: Vec<String>,
    /// Every unprocessed name with its tier, in lookup order
    pub pending: Vec<(String, Tier)>,
}

impl Tiers {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_names(&self) -> Vec<String> {
        self.pending.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Partition `names` into tiers, skipping anything in `processed`
///
/// Markers are read from the declared definitions via `is_type_match`, so
/// no bean is created. Results are never cached; call again after every
/// invocation wave.
pub fn classify(
    factory: &dyn ConfigurableBeanFactory,
    names: &[String],
    processed: &HashSet<String>,
) -> Tiers {
    let mut tiers = Tiers::default();
    for name in names {
        if processed.contains(name) {
            continue;
        }
        let tier = tier_of(factory, name);
        match tier {
            Tier::Priority => tiers.priority.push(name.clone()),
            Tier::Ordered => tiers.ordered.push(name.clone()),
            _ => tiers.plain.push(name.clone()),
        }
        tiers.pending.push((name.clone(), tier));
    }
    tiers
}

/// Tier of a single bean by its declared ordering markers
pub fn tier_of(factory: &dyn ConfigurableBeanFactory, name: &str) -> Tier {
    if factory.is_type_match(name, Capabilities::PRIORITY_ORDERED) {
        Tier::Priority
    } else if factory.is_type_match(name, Capabilities::ORDERED) {
        Tier::Ordered
    } else {
        Tier::Plain
    }
}
