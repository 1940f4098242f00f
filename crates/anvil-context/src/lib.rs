//! # anvil-context
//!
//! Container runtime for anvil providing:
//! - `DefaultListableBeanFactory` with ordered definitions and a lock-free decorator chain
//! - The three-phase post-processor bootstrap (registry, factory, decorators)
//! - Application context lifecycle, events and listener detection
//! - Placeholder substitution and configuration import processing

pub mod bootstrap;
pub mod chain;
pub mod classify;
pub mod configuration;
pub mod context;
pub mod detector;
pub mod events;
pub mod factory;
pub mod placeholder;

pub use bootstrap::{PostProcessorChecker, PostProcessorDelegate};
pub use chain::DecoratorChain;
pub use classify::{classify, tier_of, Tiers};
pub use configuration::{ConfigurationProcessor, CONFIGURATION_PROCESSOR_BEAN_NAME};
pub use context::ApplicationContext;
pub use detector::ApplicationListenerDetector;
pub use events::EventMulticaster;
pub use factory::DefaultListableBeanFactory;
pub use placeholder::{PropertyPlaceholderConfigurer, PLACEHOLDER_CONFIGURER_BEAN_NAME};
