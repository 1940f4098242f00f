//! Transaction attribute pointcut
//!
//! Static method matcher backed by a [`TransactionAttributeSource`]. A type
//! that is already a transactional proxy never matches, so beans are not
//! proxied twice. Without a source every method matches.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anvil_core::{MethodDescriptor, TypeDescriptor, TypeMarkers};

use crate::source::TransactionAttributeSource;

/// Type-level filter consulted before method matching
pub type ClassFilter = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

/// Decides which types and methods an advisor applies to
pub trait Pointcut: Send + Sync {
    fn matches_type(&self, target: &TypeDescriptor) -> bool;

    fn matches(&self, method: &MethodDescriptor, target: Option<&TypeDescriptor>) -> bool;
}

#[derive(Clone, Default)]
pub struct TransactionAttributeSourcePointcut {
    source: Option<Arc<dyn TransactionAttributeSource>>,
    class_filter: Option<ClassFilter>,
}

impl TransactionAttributeSourcePointcut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Arc<dyn TransactionAttributeSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn set_source(&mut self, source: Arc<dyn TransactionAttributeSource>) {
        self.source = Some(source);
    }

    /// Restrict matching to types accepted by `filter` (default: every type)
    pub fn with_class_filter(mut self, filter: ClassFilter) -> Self {
        self.class_filter = Some(filter);
        self
    }

    pub fn source(&self) -> Option<&Arc<dyn TransactionAttributeSource>> {
        self.source.as_ref()
    }
}

impl Pointcut for TransactionAttributeSourcePointcut {
    fn matches_type(&self, target: &TypeDescriptor) -> bool {
        self.class_filter.as_ref().map_or(true, |filter| filter(target))
    }

    fn matches(&self, method: &MethodDescriptor, target: Option<&TypeDescriptor>) -> bool {
        if target.is_some_and(|t| t.has_marker(TypeMarkers::TRANSACTIONAL_PROXY)) {
            return false;
        }
        match &self.source {
            None => true,
            Some(source) => source.transaction_attribute(method, target).is_some(),
        }
    }
}

impl PartialEq for TransactionAttributeSourcePointcut {
    fn eq(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl Eq for TransactionAttributeSourcePointcut {}

impl Hash for TransactionAttributeSourcePointcut {
    // Equal pointcuts may wrap different filters; hash only the type.
    fn hash<H: Hasher>(&self, state: &mut H) {
        "TransactionAttributeSourcePointcut".hash(state);
    }
}

impl fmt::Debug for TransactionAttributeSourcePointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionAttributeSourcePointcut")
            .field("source", &self.source)
            .field("class_filter", &self.class_filter.is_some())
            .finish()
    }
}

impl fmt::Display for TransactionAttributeSourcePointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "TransactionAttributeSourcePointcut: {:?}", source),
            None => write!(f, "TransactionAttributeSourcePointcut: null"),
        }
    }
}
