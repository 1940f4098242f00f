//! Capability markers, definition roles and priority tiers
//!
//! Extensions declare what they are through a closed flag set instead of a
//! type hierarchy. The container only ever asks "does this identity hold
//! capability X", which is a pure function over [`Capabilities`].

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Capability markers declared by a bean definition or exposed by a bean
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct Capabilities: u16 {
        /// Runs ahead of every merely ordered extension in its phase
        const PRIORITY_ORDERED = 1 << 0;
        /// Carries an explicit order value
        const ORDERED = 1 << 1;
        /// May add or replace bean definitions before any bean exists
        const REGISTRY_POST_PROCESSOR = 1 << 2;
        /// May alter already-registered definitions
        const FACTORY_POST_PROCESSOR = 1 << 3;
        /// Decorates every bean around initialization
        const BEAN_POST_PROCESSOR = 1 << 4;
        /// Decorator that also post-processes merged definitions
        const MERGED_DEFINITION = 1 << 5;
        /// Receives application events
        const APPLICATION_LISTENER = 1 << 6;
    }
}

impl Capabilities {
    /// Close the set over the implications between markers
    ///
    /// A registry post-processor is also a factory post-processor, a
    /// merged-definition processor is also a decorator and a priority marker
    /// is also an order marker.
    pub fn with_implied(self) -> Self {
        let mut caps = self;
        if caps.contains(Self::REGISTRY_POST_PROCESSOR) {
            caps |= Self::FACTORY_POST_PROCESSOR;
        }
        if caps.contains(Self::MERGED_DEFINITION) {
            caps |= Self::BEAN_POST_PROCESSOR;
        }
        if caps.contains(Self::PRIORITY_ORDERED) {
            caps |= Self::ORDERED;
        }
        caps
    }

    /// Priority tier implied by the ordering markers
    pub fn tier(self) -> Tier {
        if self.contains(Self::PRIORITY_ORDERED) {
            Tier::Priority
        } else if self.contains(Self::ORDERED) {
            Tier::Ordered
        } else {
            Tier::Plain
        }
    }
}

/// Role hint of a bean definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Major part of the application, typically user-defined
    #[default]
    Application,
    /// Supporting part of some larger configuration
    Support,
    /// Entirely internal to the container
    Infrastructure,
}

/// Instance scope of a bean definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One shared instance per container
    #[default]
    Singleton,
    /// A new instance on every request
    Prototype,
}

/// Priority tier an extension lands in for one classification wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Priority,
    Ordered,
    Plain,
    /// Merged-definition decorators, re-installed after every other tier
    Internal,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Priority => "priority",
            Tier::Ordered => "ordered",
            Tier::Plain => "plain",
            Tier::Internal => "internal",
        };
        f.write_str(name)
    }
}
