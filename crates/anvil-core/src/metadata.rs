//! Type and annotation metadata
//!
//! The container never parses annotations itself. Callers describe their
//! configuration types and methods with these descriptors and the container
//! reads them as plain data.

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How advice is applied to matched beans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceMode {
    /// Wrap beans in a proxy object
    #[default]
    Proxy,
    /// Weave advice into the target type
    AspectJ,
}

/// A single annotation attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Mode(AdviceMode),
    List(Vec<String>),
}

/// Attributes of one annotation, keyed by attribute name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationAttributes {
    values: IndexMap<String, AttributeValue>,
}

impl AnnotationAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, replacing any previous value
    pub fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(AttributeValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(AttributeValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(AttributeValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn get_mode(&self, name: &str) -> Option<AdviceMode> {
        match self.values.get(name) {
            Some(AttributeValue::Mode(mode)) => Some(*mode),
            _ => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name) {
            Some(AttributeValue::List(values)) => Some(values),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Annotations declared on a configuration type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationMetadata {
    class_name: String,
    annotations: IndexMap<String, AnnotationAttributes>,
}

impl AnnotationMetadata {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            annotations: IndexMap::new(),
        }
    }

    /// Declare an annotation with its attributes
    pub fn with_annotation(mut self, annotation: &str, attributes: AnnotationAttributes) -> Self {
        self.annotations.insert(annotation.to_string(), attributes);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Annotation type names in declaration order
    pub fn annotation_types(&self) -> impl Iterator<Item = &str> {
        self.annotations.keys().map(String::as_str)
    }

    pub fn attributes_for(&self, annotation: &str) -> Option<&AnnotationAttributes> {
        self.annotations.get(annotation)
    }

    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.contains_key(annotation)
    }
}

bitflags! {
    /// Markers carried by a runtime type
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeMarkers: u8 {
        /// Type is a transactional proxy produced by the container
        const TRANSACTIONAL_PROXY = 1 << 0;
        /// Type is a container-generated proxy of any kind
        const PROXY = 1 << 1;
    }
}

/// A method as seen by pointcuts and attribute sources
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    declaring_type: String,
    public: bool,
    annotations: IndexMap<String, AnnotationAttributes>,
}

impl MethodDescriptor {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaring_type: declaring_type.into(),
            public: true,
            annotations: IndexMap::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: &str, attributes: AnnotationAttributes) -> Self {
        self.annotations.insert(annotation.to_string(), attributes);
        self
    }

    pub fn non_public(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn annotation(&self, annotation: &str) -> Option<&AnnotationAttributes> {
        self.annotations.get(annotation)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// A runtime type: its name, methods, type-level annotations and markers
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    methods: Vec<MethodDescriptor>,
    annotations: IndexMap<String, AnnotationAttributes>,
    markers: TypeMarkers,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            annotations: IndexMap::new(),
            markers: TypeMarkers::empty(),
        }
    }

    /// Add a public method declared on this type
    pub fn with_method(mut self, name: &str) -> Self {
        let method = MethodDescriptor::new(self.name.clone(), name);
        self.methods.push(method);
        self
    }

    /// Add a fully described method
    pub fn with_method_descriptor(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_annotation(mut self, annotation: &str, attributes: AnnotationAttributes) -> Self {
        self.annotations.insert(annotation.to_string(), attributes);
        self
    }

    pub fn with_markers(mut self, markers: TypeMarkers) -> Self {
        self.markers |= markers;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn annotation(&self, annotation: &str) -> Option<&AnnotationAttributes> {
        self.annotations.get(annotation)
    }

    pub fn markers(&self) -> TypeMarkers {
        self.markers
    }

    pub fn has_marker(&self, marker: TypeMarkers) -> bool {
        self.markers.contains(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_attribute_access() {
        let attrs = AnnotationAttributes::new()
            .with("mode", AttributeValue::Mode(AdviceMode::Proxy))
            .with("proxyTargetClass", AttributeValue::Bool(false))
            .with("order", AttributeValue::Int(5));

        assert_eq!(attrs.get_mode("mode"), Some(AdviceMode::Proxy));
        assert_eq!(attrs.get_bool("proxyTargetClass"), Some(false));
        assert_eq!(attrs.get_int("order"), Some(5));
        // wrong type is not coerced
        assert_eq!(attrs.get_bool("order"), None);
        assert_eq!(attrs.get_str("missing"), None);
    }

    #[test]
    fn test_annotation_types_keep_declaration_order() {
        let metadata = AnnotationMetadata::new("MainConfig")
            .with_annotation("EnableTransactionManagement", AnnotationAttributes::new())
            .with_annotation("EnableAspectJAutoProxy", AnnotationAttributes::new())
            .with_annotation("ComponentScan", AnnotationAttributes::new());

        let types: Vec<_> = metadata.annotation_types().collect();
        assert_eq!(
            types,
            vec!["EnableTransactionManagement", "EnableAspectJAutoProxy", "ComponentScan"]
        );
    }

    #[test]
    fn test_type_descriptor_methods_belong_to_type() {
        let ty = TypeDescriptor::new("PayService")
            .with_method("pay")
            .with_method("balance");

        let pay = ty.method("pay").unwrap();
        assert_eq!(pay.declaring_type(), "PayService");
        assert_eq!(pay.to_string(), "PayService::pay");
        assert!(ty.method("refund").is_none());
    }
}
