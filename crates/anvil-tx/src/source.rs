//! Transaction attribute sources
//!
//! A source answers one question: which [`TransactionAttribute`] applies to
//! a method, if any. Three strategies are provided:
//! - [`AnnotationTransactionAttributeSource`] reads `Transactional` metadata
//! - [`NameMatchTransactionAttributeSource`] matches method names against
//!   glob patterns
//! - [`CompositeTransactionAttributeSource`] asks several sources in turn

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anvil_core::{Error, MethodDescriptor, Result, TypeDescriptor};
use globset::{Glob, GlobMatcher};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::attribute::{TransactionAttribute, TRANSACTIONAL};

/// Resolves the transaction attribute of a method
pub trait TransactionAttributeSource: Send + Sync + fmt::Debug {
    /// Attribute for `method` invoked on `target`, or `None` if the method
    /// is not transactional
    fn transaction_attribute(
        &self,
        method: &MethodDescriptor,
        target: Option<&TypeDescriptor>,
    ) -> Option<TransactionAttribute>;
}

/// Target type (if known), declaring type and method name
type CacheKey = (Option<String>, String, String);

/// Reads `Transactional` annotations from method and type metadata
///
/// A method annotation takes precedence over one on the target type.
/// Results are cached per target type and method.
#[derive(Debug)]
pub struct AnnotationTransactionAttributeSource {
    public_methods_only: bool,
    cache: RwLock<HashMap<CacheKey, Option<TransactionAttribute>>>,
}

impl AnnotationTransactionAttributeSource {
    pub fn new() -> Self {
        Self {
            public_methods_only: true,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Also consider non-public methods
    pub fn allow_non_public_methods(mut self) -> Self {
        self.public_methods_only = false;
        self
    }

    fn compute(
        &self,
        method: &MethodDescriptor,
        target: Option<&TypeDescriptor>,
    ) -> Option<TransactionAttribute> {
        if self.public_methods_only && !method.is_public() {
            return None;
        }
        let annotation = method
            .annotation(TRANSACTIONAL)
            .or_else(|| target.and_then(|t| t.annotation(TRANSACTIONAL)))?;
        match TransactionAttribute::from_annotation(annotation) {
            Ok(attribute) => Some(attribute),
            Err(e) => {
                warn!(method = %method, error = %e, "Ignoring invalid transactional metadata");
                None
            }
        }
    }
}

impl Default for AnnotationTransactionAttributeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionAttributeSource for AnnotationTransactionAttributeSource {
    fn transaction_attribute(
        &self,
        method: &MethodDescriptor,
        target: Option<&TypeDescriptor>,
    ) -> Option<TransactionAttribute> {
        let key = (
            target.map(|t| t.name().to_string()),
            method.declaring_type().to_string(),
            method.name().to_string(),
        );
        if let Some(cached) = self.cache.read().get(&key) {
            return cached.clone();
        }
        let attribute = self.compute(method, target);
        if let Some(attribute) = &attribute {
            trace!(method = %method, attribute = %attribute, "Resolved transaction attribute");
        }
        self.cache.write().insert(key, attribute.clone());
        attribute
    }
}

/// Matches method names against exact names and glob patterns
///
/// An exact name wins over any pattern; among matching patterns the
/// longest one wins.
#[derive(Debug, Default)]
pub struct NameMatchTransactionAttributeSource {
    exact: IndexMap<String, TransactionAttribute>,
    patterns: Vec<(String, GlobMatcher, TransactionAttribute)>,
}

impl NameMatchTransactionAttributeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a method name or glob pattern (e.g. `find*`) to an attribute
    pub fn add_method(mut self, pattern: &str, attribute: TransactionAttribute) -> Result<Self> {
        if pattern.contains(['*', '?', '[']) {
            let matcher = Glob::new(pattern)
                .map_err(|e| Error::invalid_config(format!("invalid method pattern '{}': {}", pattern, e)))?
                .compile_matcher();
            self.patterns.push((pattern.to_string(), matcher, attribute));
        } else {
            self.exact.insert(pattern.to_string(), attribute);
        }
        Ok(self)
    }
}

impl TransactionAttributeSource for NameMatchTransactionAttributeSource {
    fn transaction_attribute(
        &self,
        method: &MethodDescriptor,
        _target: Option<&TypeDescriptor>,
    ) -> Option<TransactionAttribute> {
        let name = method.name();
        if let Some(attribute) = self.exact.get(name) {
            return Some(attribute.clone());
        }
        self.patterns
            .iter()
            .filter(|(_, matcher, _)| matcher.is_match(name))
            .max_by_key(|(pattern, _, _)| pattern.len())
            .map(|(_, _, attribute)| attribute.clone())
    }
}

/// Asks each source in order and returns the first attribute found
#[derive(Debug, Default)]
pub struct CompositeTransactionAttributeSource {
    sources: Vec<Arc<dyn TransactionAttributeSource>>,
}

impl CompositeTransactionAttributeSource {
    pub fn new(sources: Vec<Arc<dyn TransactionAttributeSource>>) -> Self {
        Self { sources }
    }
}

impl TransactionAttributeSource for CompositeTransactionAttributeSource {
    fn transaction_attribute(
        &self,
        method: &MethodDescriptor,
        target: Option<&TypeDescriptor>,
    ) -> Option<TransactionAttribute> {
        self.sources
            .iter()
            .find_map(|source| source.transaction_attribute(method, target))
    }
}
