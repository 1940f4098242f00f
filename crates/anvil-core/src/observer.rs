//! Bootstrap observation and logging
//!
//! This module provides the `BootstrapObserver` trait for watching the
//! post-processor pipeline, a `TracingObserver` that logs with the `tracing`
//! crate and a `RecordingObserver` that keeps every event for inspection.

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::events::{BootstrapEvent, Phase};

/// Observer of bootstrap events
///
/// Events are delivered synchronously on the bootstrap thread, in the order
/// they happen.
pub trait BootstrapObserver: Send + Sync {
    fn on_event(&self, event: &BootstrapEvent);
}

/// An observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl BootstrapObserver for NoOpObserver {
    fn on_event(&self, _event: &BootstrapEvent) {}
}

/// An observer that logs bootstrap events using the `tracing` crate
///
/// # Log Levels
///
/// - phase start, invocations, discovery passes, installs: DEBUG
/// - phase completion: INFO
/// - early bean creation: DEBUG (the guard decorator already logs it at INFO)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BootstrapObserver for TracingObserver {
    fn on_event(&self, event: &BootstrapEvent) {
        match event {
            BootstrapEvent::PhaseStarted { phase } => {
                debug!(%phase, "Bootstrap phase started");
            }
            BootstrapEvent::PhaseCompleted { phase, invoked } => {
                info!(%phase, invoked, "Bootstrap phase completed");
            }
            BootstrapEvent::PostProcessorInvoked { phase, name, tier } => match tier {
                Some(tier) => debug!(%phase, %tier, processor = %name, "Invoking post-processor"),
                None => debug!(%phase, processor = %name, "Invoking supplied post-processor"),
            },
            BootstrapEvent::DiscoveryPass { pass, discovered } => {
                debug!(
                    pass,
                    count = discovered.len(),
                    "Discovered registry post-processors: {}",
                    discovered.join(", ")
                );
            }
            BootstrapEvent::DecoratorInstalled {
                name,
                tier,
                position,
            } => {
                debug!(decorator = %name, ?tier, position, "Installed bean post-processor");
            }
            BootstrapEvent::EarlyBeanCreated {
                name,
                type_name,
                installed,
                target,
            } => {
                debug!(
                    bean = %name,
                    type_name = %type_name,
                    installed,
                    target,
                    "Early bean creation reported"
                );
            }
        }
    }
}

/// An observer that records every event
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<BootstrapEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far
    pub fn events(&self) -> Vec<BootstrapEvent> {
        self.events.lock().clone()
    }

    /// Names of invoked post-processors, in invocation order
    pub fn invoked(&self, phase: Phase) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BootstrapEvent::PostProcessorInvoked { phase: p, name, .. } if *p == phase => {
                    Some(name.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Names of beans reported as created too early
    pub fn early_beans(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                BootstrapEvent::EarlyBeanCreated { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl BootstrapObserver for RecordingObserver {
    fn on_event(&self, event: &BootstrapEvent) {
        self.events.lock().push(event.clone());
    }
}
