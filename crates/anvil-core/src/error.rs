//! Error types for anvil-core

use thiserror::Error;

/// Result type alias using anvil-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the anvil container
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No definition registered under the requested name
    #[error("No bean named '{name}' is defined")]
    NoSuchBeanDefinition { name: String },

    /// Registering a definition would replace an existing one
    #[error("Cannot register bean definition '{name}': a definition is already bound and overriding is disabled")]
    DefinitionOverride { name: String },

    /// A singleton instance is already bound under the name
    #[error("Cannot register singleton '{name}': an instance is already bound")]
    SingletonExists { name: String },

    /// Abstract definitions are templates and never instantiated
    #[error("Bean definition '{name}' is abstract")]
    AbstractDefinition { name: String },

    /// The bean does not expose the requested capability
    #[error("Bean '{name}' does not provide capability {capability}")]
    BeanNotOfRequiredCapability { name: String, capability: String },

    /// Circular reference during bean creation
    #[error("Bean '{name}' is currently in creation: is there an unresolvable circular reference?")]
    CurrentlyInCreation { name: String },

    /// Bean creation failed inside its supplier
    #[error("Error creating bean '{name}': {message}")]
    BeanCreation { name: String, message: String },

    /// Registry-mutating extensions kept registering new ones
    #[error("Registry post-processor discovery did not settle after {passes} passes; still pending: {}", pending.join(", "))]
    DiscoveryLimitExceeded { passes: u32, pending: Vec<String> },

    /// More than one bean claims an exclusive-singleton contract
    #[error("Only one {contract} may exist, found: {}", found.join(", "))]
    MultipleConfigurers { contract: String, found: Vec<String> },

    /// Import metadata required by an imported configuration is absent
    #[error("@{annotation} is not present on importing class {class_name}")]
    MissingImportMetadata {
        annotation: String,
        class_name: String,
    },

    /// Placeholder could not be resolved against any property source
    #[error("Could not resolve placeholder '{placeholder}' in bean definition '{bean}'")]
    UnresolvablePlaceholder { placeholder: String, bean: String },

    /// Context lifecycle violation
    #[error("Application context: {message}")]
    ContextState { message: String },

    /// Failure reported by an extension or listener
    #[error("{source_name} failed: {message}")]
    Processor {
        source_name: String,
        message: String,
    },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing definition error
    pub fn no_such_bean(name: impl Into<String>) -> Self {
        Self::NoSuchBeanDefinition { name: name.into() }
    }

    /// Create a definition override error
    pub fn definition_override(name: impl Into<String>) -> Self {
        Self::DefinitionOverride { name: name.into() }
    }

    /// Create a singleton-exists error
    pub fn singleton_exists(name: impl Into<String>) -> Self {
        Self::SingletonExists { name: name.into() }
    }

    /// Create an abstract definition error
    pub fn abstract_definition(name: impl Into<String>) -> Self {
        Self::AbstractDefinition { name: name.into() }
    }

    /// Create a capability mismatch error
    pub fn not_of_required_capability(
        name: impl Into<String>,
        capability: impl std::fmt::Debug,
    ) -> Self {
        Self::BeanNotOfRequiredCapability {
            name: name.into(),
            capability: format!("{:?}", capability),
        }
    }

    /// Create a circular creation error
    pub fn currently_in_creation(name: impl Into<String>) -> Self {
        Self::CurrentlyInCreation { name: name.into() }
    }

    /// Create a bean creation error
    pub fn bean_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BeanCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a discovery limit error
    pub fn discovery_limit_exceeded(passes: u32, pending: Vec<String>) -> Self {
        Self::DiscoveryLimitExceeded { passes, pending }
    }

    /// Create a multiple configurers error
    pub fn multiple_configurers(contract: impl Into<String>, found: Vec<String>) -> Self {
        Self::MultipleConfigurers {
            contract: contract.into(),
            found,
        }
    }

    /// Create a missing import metadata error
    pub fn missing_import_metadata(
        annotation: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self::MissingImportMetadata {
            annotation: annotation.into(),
            class_name: class_name.into(),
        }
    }

    /// Create an unresolvable placeholder error
    pub fn unresolvable_placeholder(placeholder: impl Into<String>, bean: impl Into<String>) -> Self {
        Self::UnresolvablePlaceholder {
            placeholder: placeholder.into(),
            bean: bean.into(),
        }
    }

    /// Create a context state error
    pub fn context_state(message: impl Into<String>) -> Self {
        Self::ContextState {
            message: message.into(),
        }
    }

    /// Create an extension failure
    pub fn processor(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processor {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Stable name of the error kind, used by rollback rules and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "ConfigNotFound",
            Self::InvalidConfig { .. } => "InvalidConfig",
            Self::YamlParse(_) => "YamlParse",
            Self::Io(_) => "Io",
            Self::NoSuchBeanDefinition { .. } => "NoSuchBeanDefinition",
            Self::DefinitionOverride { .. } => "DefinitionOverride",
            Self::SingletonExists { .. } => "SingletonExists",
            Self::AbstractDefinition { .. } => "AbstractDefinition",
            Self::BeanNotOfRequiredCapability { .. } => "BeanNotOfRequiredCapability",
            Self::CurrentlyInCreation { .. } => "CurrentlyInCreation",
            Self::BeanCreation { .. } => "BeanCreation",
            Self::DiscoveryLimitExceeded { .. } => "DiscoveryLimitExceeded",
            Self::MultipleConfigurers { .. } => "MultipleConfigurers",
            Self::MissingImportMetadata { .. } => "MissingImportMetadata",
            Self::UnresolvablePlaceholder { .. } => "UnresolvablePlaceholder",
            Self::ContextState { .. } => "ContextState",
            Self::Processor { .. } => "Processor",
        }
    }

    /// Whether this error aborts bootstrap as a configuration problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MultipleConfigurers { .. }
                | Self::MissingImportMetadata { .. }
                | Self::UnresolvablePlaceholder { .. }
                | Self::DefinitionOverride { .. }
        )
    }
}
