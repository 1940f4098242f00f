//! Bootstrap configuration

mod loader;

pub use loader::HierarchicalConfigLoader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings that control container bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BootstrapConfig {
    /// Cap on repeated registry post-processor discovery passes
    #[serde(default = "default_max_discovery_passes")]
    pub max_discovery_passes: u32,

    /// Whether registering a definition under a taken name replaces it
    #[serde(default = "default_true")]
    pub allow_definition_overriding: bool,

    /// Whether the guard decorator reports beans created too early
    #[serde(default = "default_true")]
    pub report_early_beans: bool,

    /// Leave unresolvable placeholders in place instead of failing
    #[serde(default)]
    pub ignore_unresolvable_placeholders: bool,

    /// Resolve placeholders from the process environment as a last resort
    #[serde(default = "default_true")]
    pub system_environment_fallback: bool,

    /// Placeholder values
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            max_discovery_passes: default_max_discovery_passes(),
            allow_definition_overriding: true,
            report_early_beans: true,
            ignore_unresolvable_placeholders: false,
            system_environment_fallback: true,
            properties: BTreeMap::new(),
        }
    }
}

impl BootstrapConfig {
    /// Set a placeholder value
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

fn default_max_discovery_passes() -> u32 {
    64
}

fn default_true() -> bool {
    true
}
