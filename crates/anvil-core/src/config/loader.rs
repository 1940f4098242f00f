//! Hierarchical configuration loader with precedence
//!
//! Loads bootstrap configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.anvil/bootstrap.yaml)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (ANVIL_* prefix)
//! 5. CLI flags (handled by caller)
//!
//! File layers are merged key by key, so a file only needs the keys it changes.

use crate::config::BootstrapConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde_yaml_ng::{Mapping, Value};
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const DEFAULTS_FILE: &str = "bootstrap-defaults.yaml";
const USER_FILE: &str = "bootstrap.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Directory holding the user config file
    config_dir: Option<Utf8PathBuf>,
    /// Explicit config file, highest file precedence
    explicit: Option<Utf8PathBuf>,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at the standard config directory (~/.anvil)
    pub fn new() -> Self {
        Self {
            config_dir: Self::default_config_dir(),
            explicit: None,
        }
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self {
            config_dir: Some(config_dir),
            explicit: None,
        }
    }

    /// Layer an explicit config file on top of the user config
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    fn default_config_dir() -> Option<Utf8PathBuf> {
        dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| home.join(".anvil"))
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> Option<&Utf8Path> {
        self.config_dir.as_deref()
    }

    /// Load bootstrap configuration with hierarchical precedence
    pub fn load(&self) -> Result<BootstrapConfig> {
        let mut merged = Self::load_embedded_value(DEFAULTS_FILE)?;

        if let Some(dir) = &self.config_dir {
            let user_path = dir.join(USER_FILE);
            if user_path.exists() {
                debug!(path = %user_path, "Loading user bootstrap config");
                merge_values(&mut merged, Self::load_yaml_value(&user_path)?);
            }
        }

        if let Some(path) = &self.explicit {
            if !path.exists() {
                return Err(Error::config_not_found(path.as_str()));
            }
            debug!(path = %path, "Loading explicit bootstrap config");
            merge_values(&mut merged, Self::load_yaml_value(path)?);
        }

        let config: BootstrapConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Failed to parse bootstrap config: {}", e)))?;

        self.apply_env_overrides(config)
    }

    /// Load the embedded defaults alone
    pub fn embedded_defaults() -> Result<BootstrapConfig> {
        let value = Self::load_embedded_value(DEFAULTS_FILE)?;
        serde_yaml_ng::from_value(value).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded config {}: {}", DEFAULTS_FILE, e))
        })
    }

    fn load_embedded_value(filename: &str) -> Result<Value> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded config {}: {}", filename, e))
        })
    }

    fn load_yaml_value(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        match value {
            // an empty file is an empty layer
            Value::Null => Ok(Value::Mapping(Mapping::new())),
            Value::Mapping(_) => Ok(value),
            _ => Err(Error::invalid_config(format!(
                "{} must contain a mapping at the top level",
                path
            ))),
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, mut config: BootstrapConfig) -> Result<BootstrapConfig> {
        if let Ok(val) = env::var("ANVIL_MAX_DISCOVERY_PASSES") {
            config.max_discovery_passes = val.parse().map_err(|_| {
                Error::invalid_config("ANVIL_MAX_DISCOVERY_PASSES must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("ANVIL_ALLOW_DEFINITION_OVERRIDING") {
            config.allow_definition_overriding =
                parse_flag("ANVIL_ALLOW_DEFINITION_OVERRIDING", &val)?;
        }

        if let Ok(val) = env::var("ANVIL_REPORT_EARLY_BEANS") {
            config.report_early_beans = parse_flag("ANVIL_REPORT_EARLY_BEANS", &val)?;
        }

        if let Ok(val) = env::var("ANVIL_IGNORE_UNRESOLVABLE_PLACEHOLDERS") {
            config.ignore_unresolvable_placeholders =
                parse_flag("ANVIL_IGNORE_UNRESOLVABLE_PLACEHOLDERS", &val)?;
        }

        if let Ok(val) = env::var("ANVIL_SYSTEM_ENVIRONMENT_FALLBACK") {
            config.system_environment_fallback =
                parse_flag("ANVIL_SYSTEM_ENVIRONMENT_FALLBACK", &val)?;
        }

        if config.max_discovery_passes == 0 {
            return Err(Error::invalid_config(
                "max-discovery-passes must be at least 1",
            ));
        }

        Ok(config)
    }
}

impl Default for HierarchicalConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_flag(var: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_config(format!("{} must be true or false", var))),
    }
}

/// Overlay `overlay` onto `base`, recursing into nested mappings
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
