use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::Tier;

/// Bootstrap phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Registry post-processors add or replace definitions
    RegistryMutation,
    /// Factory post-processors rewrite definitions
    FactoryMutation,
    /// Decorators are looked up and installed
    DecoratorRegistration,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::RegistryMutation => "registry-mutation",
            Phase::FactoryMutation => "factory-mutation",
            Phase::DecoratorRegistration => "decorator-registration",
        };
        f.write_str(name)
    }
}

/// Container bootstrap events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BootstrapEvent {
    /// A phase started
    PhaseStarted { phase: Phase },

    /// A phase finished
    PhaseCompleted { phase: Phase, invoked: usize },

    /// A post-processor hook was invoked
    PostProcessorInvoked {
        phase: Phase,
        name: String,
        /// Tier the processor ran in; `None` for caller-supplied processors
        #[serde(skip_serializing_if = "Option::is_none", default)]
        tier: Option<Tier>,
    },

    /// A repeated registry pass found unprocessed processors
    DiscoveryPass { pass: u32, discovered: Vec<String> },

    /// A decorator was installed on the factory
    DecoratorInstalled {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        tier: Option<Tier>,
        /// Chain length after installation
        position: usize,
    },

    /// A bean was created before every decorator was installed
    EarlyBeanCreated {
        name: String,
        type_name: String,
        installed: usize,
        target: usize,
    },
}

impl BootstrapEvent {
    /// Name of the processor or bean the event is about, if any
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::PostProcessorInvoked { name, .. }
            | Self::DecoratorInstalled { name, .. }
            | Self::EarlyBeanCreated { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Events published to application listeners
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplicationEvent {
    /// The context finished refreshing
    ContextRefreshed { bean_count: usize },

    /// The context was closed
    ContextClosed,

    /// Application-defined event
    Custom {
        name: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl ApplicationEvent {
    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::Custom {
            name: name.into(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = BootstrapEvent::PostProcessorInvoked {
            phase: Phase::RegistryMutation,
            name: "scanner".to_string(),
            tier: Some(Tier::Priority),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"post_processor_invoked\""));
        assert!(json.contains("\"phase\":\"registry_mutation\""));
        assert!(json.contains("\"tier\":\"priority\""));

        let parsed: BootstrapEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_supplied_processor_event_omits_tier() {
        let event = BootstrapEvent::PostProcessorInvoked {
            phase: Phase::FactoryMutation,
            name: "supplied".to_string(),
            tier: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("tier"));
        assert_eq!(event.subject(), Some("supplied"));
    }
}
