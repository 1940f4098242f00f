//! Installed decorator chain
//!
//! The chain is read on every bean creation, including from request threads
//! once the container is live, so readers load an immutable snapshot without
//! locking. Writers publish a new snapshot with `rcu`.

use std::sync::Arc;

use anvil_core::BeanPostProcessor;
use arc_swap::ArcSwap;

type Snapshot = Vec<Arc<dyn BeanPostProcessor>>;

/// Ordered list of installed bean post-processors
pub struct DecoratorChain {
    snap: ArcSwap<Snapshot>,
}

impl DecoratorChain {
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append a decorator; an already installed instance is moved to the end
    ///
    /// Returns the chain length after the update.
    pub fn add(&self, processor: Arc<dyn BeanPostProcessor>) -> usize {
        self.snap.rcu(|cur| {
            let mut next: Snapshot = cur
                .iter()
                .filter(|p| !same_instance(p, &processor))
                .cloned()
                .collect();
            next.push(processor.clone());
            next
        });
        self.len()
    }

    /// Remove a decorator; returns whether it was installed
    pub fn remove(&self, processor: &Arc<dyn BeanPostProcessor>) -> bool {
        let prev = self.snap.rcu(|cur| {
            cur.iter()
                .filter(|p| !same_instance(p, processor))
                .cloned()
                .collect::<Snapshot>()
        });
        prev.iter().any(|p| same_instance(p, processor))
    }

    /// Current snapshot of the chain
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snap.load_full()
    }

    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of installed decorators in chain order
    pub fn names(&self) -> Vec<String> {
        self.snap
            .load()
            .iter()
            .map(|p| p.processor_name().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.snap.store(Arc::new(Vec::new()));
    }
}

impl Default for DecoratorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity comparison ignoring vtable pointers
fn same_instance(a: &Arc<dyn BeanPostProcessor>, b: &Arc<dyn BeanPostProcessor>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
