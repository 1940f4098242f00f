//! # anvil-core
//!
//! Core contracts for the anvil container providing:
//! - Capability markers and priority tiers for container extensions
//! - Bean definitions, bean handles and type metadata
//! - Registry, factory and post-processor traits
//! - Ordering and the stable processor sorter
//! - Bootstrap/application events and the bootstrap observer
//! - Bootstrap configuration loading

pub mod bean;
pub mod capability;
pub mod config;
pub mod definition;
pub mod error;
pub mod events;
pub mod factory;
pub mod metadata;
pub mod observer;
pub mod order;
pub mod processor;

pub use bean::Bean;
pub use capability::{Capabilities, Role, Scope, Tier};
pub use config::{BootstrapConfig, HierarchicalConfigLoader};
pub use definition::{BeanDefinition, BeanSupplier};
pub use error::{Error, Result};
pub use events::{ApplicationEvent, BootstrapEvent, Phase};
pub use factory::{BeanContext, BeanDefinitionRegistry, ConfigurableBeanFactory};
pub use metadata::{
    AdviceMode, AnnotationAttributes, AnnotationMetadata, AttributeValue, MethodDescriptor,
    TypeDescriptor, TypeMarkers,
};
pub use observer::{BootstrapObserver, NoOpObserver, RecordingObserver, TracingObserver};
pub use order::{
    sort_processors, DefaultOrderComparator, OrderComparator, Ordered, HIGHEST_PRECEDENCE,
    LOWEST_PRECEDENCE,
};
pub use processor::{
    ApplicationListener, BeanPostProcessor, FactoryPostProcessor, ImportRegistrar,
    MergedDefinitionPostProcessor, RegistryPostProcessor, SuppliedPostProcessor,
};
