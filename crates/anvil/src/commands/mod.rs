//! CLI command implementations

pub mod config;
pub mod demo;

use anvil_core::{BootstrapConfig, HierarchicalConfigLoader};
use anyhow::{Context, Result};
use camino::Utf8Path;

/// Load the layered bootstrap config and apply `-D` overrides on top
pub fn load_config(path: Option<&Utf8Path>, overrides: &[(String, String)]) -> Result<BootstrapConfig> {
    let mut loader = HierarchicalConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    let mut config = loader
        .load()
        .context("Failed to load bootstrap configuration")?;
    for (key, value) in overrides {
        config = config.with_property(key, value);
    }
    Ok(config)
}
