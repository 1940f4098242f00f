//! Application event multicasting

use std::sync::Arc;

use anvil_core::{ApplicationEvent, ApplicationListener, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::trace;

/// Delivers application events to registered listeners, in registration order
#[derive(Default)]
pub struct EventMulticaster {
    listeners: RwLock<IndexMap<String, Arc<dyn ApplicationListener>>>,
}

impl EventMulticaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under its bean name; returns false if already present
    pub fn add_listener(&self, name: &str, listener: Arc<dyn ApplicationListener>) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.contains_key(name) {
            return false;
        }
        listeners.insert(name.to_string(), listener);
        trace!(listener = name, "Registered application listener");
        true
    }

    pub fn remove_listener(&self, name: &str) -> bool {
        self.listeners.write().shift_remove(name).is_some()
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.listeners.read().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Deliver `event` to every interested listener
    ///
    /// The first listener error stops delivery and is returned.
    pub fn multicast(&self, event: &ApplicationEvent) -> Result<()> {
        let listeners: Vec<_> = self.listeners.read().values().cloned().collect();
        for listener in listeners {
            if listener.supports(event) {
                listener.on_application_event(event)?;
            }
        }
        Ok(())
    }
}
