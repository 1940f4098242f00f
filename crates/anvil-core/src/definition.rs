//! Bean definitions
//!
//! A definition describes how to obtain a bean: its declared capabilities,
//! role, scope, string properties (which factory post-processors may rewrite)
//! and the supplier that builds the instance.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::bean::Bean;
use crate::capability::{Capabilities, Role, Scope};
use crate::error::Result;
use crate::factory::ConfigurableBeanFactory;
use crate::metadata::AnnotationMetadata;
use crate::processor::ImportRegistrar;

/// Builds a bean instance from its (merged) definition
///
/// The factory is passed back in so suppliers can resolve collaborators.
pub type BeanSupplier =
    Arc<dyn Fn(&dyn ConfigurableBeanFactory, &BeanDefinition) -> Result<Bean> + Send + Sync>;

/// Description of a bean managed by the container
#[derive(Clone, Default)]
pub struct BeanDefinition {
    type_name: String,
    role: Role,
    scope: Scope,
    lazy_init: bool,
    is_abstract: bool,
    parent: Option<String>,
    capabilities: Capabilities,
    order: Option<i32>,
    properties: BTreeMap<String, String>,
    contracts: BTreeSet<String>,
    depends_on: Vec<String>,
    metadata: Option<AnnotationMetadata>,
    imports: Vec<Arc<dyn ImportRegistrar>>,
    supplier: Option<BeanSupplier>,
}

impl BeanDefinition {
    /// Create a definition for the named type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// Create a child definition inheriting from `parent`
    pub fn child_of(parent: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            ..Default::default()
        }
    }

    /// Set the instance supplier
    pub fn with_supplier<F>(mut self, supplier: F) -> Self
    where
        F: Fn(&dyn ConfigurableBeanFactory, &BeanDefinition) -> Result<Bean> + Send + Sync + 'static,
    {
        self.supplier = Some(Arc::new(supplier));
        self
    }

    /// Supply a fresh instance built by a closure that ignores the factory
    pub fn with_instance<F>(self, build: F) -> Self
    where
        F: Fn() -> Bean + Send + Sync + 'static,
    {
        self.with_supplier(move |_, _| Ok(build()))
    }

    /// Declare capabilities; implied markers are added
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = (self.capabilities | capabilities).with_implied();
        self
    }

    /// Declare an order value (and the `ORDERED` marker)
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self.capabilities |= Capabilities::ORDERED;
        self
    }

    /// Declare a priority order value (and the `PRIORITY_ORDERED` marker)
    pub fn with_priority_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self.capabilities |= Capabilities::PRIORITY_ORDERED | Capabilities::ORDERED;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy_init = true;
        self
    }

    /// Mark the definition as a template that is never instantiated
    pub fn abstract_template(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Declare a named contract the bean fulfils
    pub fn implementing(mut self, contract: &str) -> Self {
        self.contracts.insert(contract.to_string());
        self
    }

    pub fn depends_on(mut self, name: &str) -> Self {
        self.depends_on.push(name.to_string());
        self
    }

    /// Attach configuration metadata read by import processing
    pub fn with_metadata(mut self, metadata: AnnotationMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add an annotation to the configuration metadata, creating it if needed
    pub fn annotate(
        mut self,
        annotation: &str,
        attributes: crate::metadata::AnnotationAttributes,
    ) -> Self {
        let metadata = self
            .metadata
            .take()
            .unwrap_or_else(|| AnnotationMetadata::new(self.type_name.clone()));
        self.metadata = Some(metadata.with_annotation(annotation, attributes));
        self
    }

    /// Attach an import registrar run against this definition's metadata
    pub fn with_import(mut self, registrar: Arc<dyn ImportRegistrar>) -> Self {
        self.imports.push(registrar);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.properties
    }

    pub fn set_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = Some(order);
        self.capabilities |= Capabilities::ORDERED;
    }

    pub fn contracts(&self) -> &BTreeSet<String> {
        &self.contracts
    }

    pub fn fulfils(&self, contract: &str) -> bool {
        self.contracts.contains(contract)
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    pub fn metadata(&self) -> Option<&AnnotationMetadata> {
        self.metadata.as_ref()
    }

    pub fn imports(&self) -> &[Arc<dyn ImportRegistrar>] {
        &self.imports
    }

    pub fn supplier(&self) -> Option<&BeanSupplier> {
        self.supplier.as_ref()
    }

    /// Overlay this (child) definition on its already merged parent
    ///
    /// Child values win; properties, contracts and capabilities are unioned.
    pub fn merged_with_parent(&self, parent: &BeanDefinition) -> BeanDefinition {
        let mut merged = parent.clone();
        if !self.type_name.is_empty() {
            merged.type_name = self.type_name.clone();
        }
        merged.role = self.role;
        merged.scope = self.scope;
        merged.lazy_init = self.lazy_init;
        merged.is_abstract = self.is_abstract;
        merged.parent = None;
        merged.capabilities = (parent.capabilities | self.capabilities).with_implied();
        if self.order.is_some() {
            merged.order = self.order;
        }
        merged
            .properties
            .extend(self.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged.contracts.extend(self.contracts.iter().cloned());
        merged.depends_on.extend(self.depends_on.iter().cloned());
        if self.metadata.is_some() {
            merged.metadata = self.metadata.clone();
        }
        merged.imports.extend(self.imports.iter().cloned());
        if self.supplier.is_some() {
            merged.supplier = self.supplier.clone();
        }
        merged
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("type_name", &self.type_name)
            .field("role", &self.role)
            .field("scope", &self.scope)
            .field("lazy_init", &self.lazy_init)
            .field("abstract", &self.is_abstract)
            .field("parent", &self.parent)
            .field("capabilities", &self.capabilities)
            .field("order", &self.order)
            .field("properties", &self.properties)
            .field("contracts", &self.contracts)
            .field("depends_on", &self.depends_on)
            .field("imports", &self.imports.len())
            .field("has_supplier", &self.supplier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_are_closed_over_implications() {
        let def = BeanDefinition::new("Scanner")
            .with_capabilities(Capabilities::REGISTRY_POST_PROCESSOR)
            .with_priority_order(0);

        let caps = def.capabilities();
        assert!(caps.contains(Capabilities::FACTORY_POST_PROCESSOR));
        assert!(caps.contains(Capabilities::ORDERED));
        assert_eq!(def.order(), Some(0));
    }

    #[test]
    fn test_child_overrides_parent_properties() {
        let parent = BeanDefinition::new("DataSource")
            .with_property("url", "jdbc:parent")
            .with_property("pool", "8")
            .with_role(Role::Support)
            .abstract_template();
        let child = BeanDefinition::child_of("base")
            .with_property("url", "jdbc:child")
            .with_instance(|| Bean::new(()));

        let merged = child.merged_with_parent(&parent);
        assert_eq!(merged.type_name(), "DataSource");
        assert_eq!(merged.property("url"), Some("jdbc:child"));
        assert_eq!(merged.property("pool"), Some("8"));
        assert!(!merged.is_abstract());
        assert!(merged.parent().is_none());
        assert!(merged.supplier().is_some());
        // role is the child's own
        assert_eq!(merged.role(), Role::Application);
    }

    #[test]
    fn test_annotate_creates_metadata_for_type() {
        let def = BeanDefinition::new("MainConfig").annotate(
            "EnableTransactionManagement",
            crate::metadata::AnnotationAttributes::new(),
        );
        let metadata = def.metadata().unwrap();
        assert_eq!(metadata.class_name(), "MainConfig");
        assert!(metadata.has_annotation("EnableTransactionManagement"));
    }
}
