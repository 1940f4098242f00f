//! Transaction attributes
//!
//! A [`TransactionAttribute`] describes how a method runs inside a
//! transaction. Attributes are read from `Transactional` annotation
//! attributes supplied as metadata.

use std::fmt;

use anvil_core::{AnnotationAttributes, Error, Result};
use serde::Serialize;

/// Annotation marking a transactional method or type
pub const TRANSACTIONAL: &str = "Transactional";

/// Transaction propagation behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Propagation {
    /// Join the current transaction or start a new one
    #[default]
    Required,
    Supports,
    Mandatory,
    RequiresNew,
    NotSupported,
    Never,
    Nested,
}

impl Propagation {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "REQUIRED" => Ok(Self::Required),
            "SUPPORTS" => Ok(Self::Supports),
            "MANDATORY" => Ok(Self::Mandatory),
            "REQUIRES_NEW" => Ok(Self::RequiresNew),
            "NOT_SUPPORTED" => Ok(Self::NotSupported),
            "NEVER" => Ok(Self::Never),
            "NESTED" => Ok(Self::Nested),
            other => Err(Error::invalid_config(format!(
                "unknown transaction propagation '{}'",
                other
            ))),
        }
    }
}

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Isolation {
    /// Use the isolation level of the underlying store
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl Isolation {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "READ_UNCOMMITTED" => Ok(Self::ReadUncommitted),
            "READ_COMMITTED" => Ok(Self::ReadCommitted),
            "REPEATABLE_READ" => Ok(Self::RepeatableRead),
            "SERIALIZABLE" => Ok(Self::Serializable),
            other => Err(Error::invalid_config(format!(
                "unknown transaction isolation '{}'",
                other
            ))),
        }
    }
}

/// Rollback rule matched against an error kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "pattern", rename_all = "snake_case")]
pub enum RollbackRule {
    RollbackOn(String),
    NoRollbackOn(String),
}

impl RollbackRule {
    fn pattern(&self) -> &str {
        match self {
            Self::RollbackOn(p) | Self::NoRollbackOn(p) => p,
        }
    }

    fn rolls_back(&self) -> bool {
        matches!(self, Self::RollbackOn(_))
    }
}

/// How a method participates in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TransactionAttribute {
    pub propagation: Propagation,
    pub isolation: Isolation,
    /// Timeout in seconds; `None` uses the manager default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    pub read_only: bool,
    /// Bean name of the transaction manager to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rollback_rules: Vec<RollbackRule>,
}

impl TransactionAttribute {
    /// Read an attribute from `Transactional` annotation attributes
    ///
    /// Recognised keys: `propagation`, `isolation`, `timeout` (negative means
    /// unset), `readOnly`, `transactionManager` (or `value`), `rollbackFor`
    /// and `noRollbackFor`.
    pub fn from_annotation(attributes: &AnnotationAttributes) -> Result<Self> {
        let mut attribute = Self::default();
        if let Some(value) = attributes.get_str("propagation") {
            attribute.propagation = Propagation::parse(value)?;
        }
        if let Some(value) = attributes.get_str("isolation") {
            attribute.isolation = Isolation::parse(value)?;
        }
        if let Some(timeout) = attributes.get_int("timeout") {
            attribute.timeout = u32::try_from(timeout).ok();
        }
        attribute.read_only = attributes.get_bool("readOnly").unwrap_or(false);
        attribute.qualifier = attributes
            .get_str("transactionManager")
            .or_else(|| attributes.get_str("value"))
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        for pattern in attributes.get_list("rollbackFor").unwrap_or_default() {
            attribute
                .rollback_rules
                .push(RollbackRule::RollbackOn(pattern.clone()));
        }
        for pattern in attributes.get_list("noRollbackFor").unwrap_or_default() {
            attribute
                .rollback_rules
                .push(RollbackRule::NoRollbackOn(pattern.clone()));
        }
        Ok(attribute)
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn with_rule(mut self, rule: RollbackRule) -> Self {
        self.rollback_rules.push(rule);
        self
    }

    /// Whether an error of `kind` rolls the transaction back
    ///
    /// The rule with the longest pattern contained in `kind` wins. Without a
    /// matching rule every error rolls back.
    pub fn rollback_on(&self, kind: &str) -> bool {
        self.rollback_rules
            .iter()
            .filter(|rule| kind.contains(rule.pattern()))
            .max_by_key(|rule| rule.pattern().len())
            .map_or(true, RollbackRule::rolls_back)
    }
}

impl fmt::Display for TransactionAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROPAGATION_{:?},ISOLATION_{:?}", self.propagation, self.isolation)?;
        if let Some(timeout) = self.timeout {
            write!(f, ",timeout_{}", timeout)?;
        }
        if self.read_only {
            write!(f, ",readOnly")?;
        }
        for rule in &self.rollback_rules {
            match rule {
                RollbackRule::RollbackOn(p) => write!(f, ",-{}", p)?,
                RollbackRule::NoRollbackOn(p) => write!(f, ",+{}", p)?,
            }
        }
        Ok(())
    }
}
