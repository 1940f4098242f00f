//! `${...}` placeholder substitution in bean definition properties

use std::collections::BTreeMap;
use std::env;
use std::sync::LazyLock;

use anvil_core::{
    BootstrapConfig, ConfigurableBeanFactory, Error, FactoryPostProcessor, Result,
    HIGHEST_PRECEDENCE,
};
use regex::{Captures, Regex};
use tracing::{debug, trace};

/// `${key}` or `${key:default}`
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("placeholder regex is valid")
});

/// Bean name the context registers the configurer under
pub const PLACEHOLDER_CONFIGURER_BEAN_NAME: &str = "anvil.propertyPlaceholderConfigurer";

/// Order value of the configurer within the priority tier
pub const PLACEHOLDER_CONFIGURER_ORDER: i32 = HIGHEST_PRECEDENCE + 10;

/// Factory post-processor that resolves placeholders in definition properties
///
/// Values come from the configured properties, then, if enabled, from the
/// process environment. A placeholder with a default uses it when neither
/// source has the key.
#[derive(Debug, Clone, Default)]
pub struct PropertyPlaceholderConfigurer {
    properties: BTreeMap<String, String>,
    system_environment_fallback: bool,
    ignore_unresolvable: bool,
}

impl PropertyPlaceholderConfigurer {
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self {
            properties,
            system_environment_fallback: false,
            ignore_unresolvable: false,
        }
    }

    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            properties: config.properties.clone(),
            system_environment_fallback: config.system_environment_fallback,
            ignore_unresolvable: config.ignore_unresolvable_placeholders,
        }
    }

    pub fn with_system_environment_fallback(mut self, enabled: bool) -> Self {
        self.system_environment_fallback = enabled;
        self
    }

    pub fn ignoring_unresolvable(mut self) -> Self {
        self.ignore_unresolvable = true;
        self
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.properties.get(key) {
            return Some(value.clone());
        }
        if self.system_environment_fallback {
            return env::var(key).ok();
        }
        None
    }

    /// Resolve every placeholder in `value`
    pub fn resolve(&self, value: &str, bean: &str) -> Result<String> {
        let mut failure = None;
        let resolved = PLACEHOLDER_RE.replace_all(value, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            match (self.lookup(key), caps.get(2)) {
                (Some(found), _) => found,
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => {
                    if !self.ignore_unresolvable && failure.is_none() {
                        failure = Some(key.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        match failure {
            Some(key) => Err(Error::unresolvable_placeholder(key, bean)),
            None => Ok(resolved.into_owned()),
        }
    }
}

impl FactoryPostProcessor for PropertyPlaceholderConfigurer {
    fn post_process_bean_factory(&self, factory: &dyn ConfigurableBeanFactory) -> Result<()> {
        let mut rewritten = 0;
        for name in factory.bean_definition_names() {
            let definition = factory.bean_definition(&name)?;
            let mut changes = Vec::new();
            for (key, value) in definition.properties() {
                if !value.contains("${") {
                    continue;
                }
                let resolved = self.resolve(value, &name)?;
                if &resolved != value {
                    trace!(bean = %name, property = %key, "Resolved placeholder");
                    changes.push((key.clone(), resolved));
                }
            }
            if changes.is_empty() {
                continue;
            }
            rewritten += changes.len();
            factory.update_bean_definition(&name, &mut |def| {
                for (key, value) in &changes {
                    def.set_property(key, value);
                }
            })?;
        }
        debug!(rewritten, "Resolved definition placeholders");
        Ok(())
    }
}
