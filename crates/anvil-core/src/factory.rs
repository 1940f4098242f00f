//! Registry and factory contracts
//!
//! Extensions receive the registry or factory as an explicitly passed handle.
//! Every method takes `&self`; implementations use interior mutability so an
//! extension may register definitions while the bootstrap is iterating.

use std::sync::Arc;

use crate::bean::Bean;
use crate::capability::Capabilities;
use crate::definition::BeanDefinition;
use crate::error::{Error, Result};
use crate::order::OrderComparator;
use crate::processor::BeanPostProcessor;

/// Registry of bean definitions keyed by name
pub trait BeanDefinitionRegistry: Send + Sync {
    /// Register a definition; replacing one is subject to the overriding policy
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> Result<()>;

    fn remove_bean_definition(&self, name: &str) -> Result<BeanDefinition>;

    fn contains_bean_definition(&self, name: &str) -> bool;

    /// A copy of the raw (unmerged) definition
    fn bean_definition(&self, name: &str) -> Result<BeanDefinition>;

    /// Definition names in registration order
    fn bean_definition_names(&self) -> Vec<String>;

    fn bean_definition_count(&self) -> usize {
        self.bean_definition_names().len()
    }

    /// Names of every bean declaring all of `capability`, in registration order
    fn bean_names_for_capability(&self, capability: Capabilities) -> Vec<String>;

    /// Names of every bean declaring the named contract, in registration order
    fn bean_names_for_contract(&self, contract: &str) -> Vec<String>;

    /// Rewrite a registered definition in place
    fn update_bean_definition(
        &self,
        name: &str,
        update: &mut dyn FnMut(&mut BeanDefinition),
    ) -> Result<()>;

    /// Drop merged-definition and capability-lookup caches
    fn clear_metadata_cache(&self);
}

/// A registry that can also create and hold beans
pub trait ConfigurableBeanFactory: BeanDefinitionRegistry {
    /// Obtain the bean, creating it on first request for singletons
    fn get_bean(&self, name: &str) -> Result<Bean>;

    /// Obtain the bean and require that it exposes `capability`
    fn get_bean_with(&self, name: &str, capability: Capabilities) -> Result<Bean> {
        let bean = self.get_bean(name)?;
        if bean.capabilities().contains(capability) {
            Ok(bean)
        } else {
            Err(Error::not_of_required_capability(name, capability))
        }
    }

    /// Whether the named bean declares `capability`, without creating it
    fn is_type_match(&self, name: &str, capability: Capabilities) -> bool;

    fn contains_singleton(&self, name: &str) -> bool;

    /// Bind an externally created instance under `name`
    fn register_singleton(&self, name: &str, bean: Bean) -> Result<()>;

    fn is_currently_in_creation(&self, name: &str) -> bool;

    /// Append a decorator; an already installed instance moves to the end
    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>);

    fn bean_post_processor_count(&self) -> usize;

    /// Comparator installed on the factory, if any
    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>>;

    /// The definition with its parent chain applied
    fn merged_bean_definition(&self, name: &str) -> Result<BeanDefinition>;
}

/// Bean being initialized, handed to decorator hooks
#[derive(Clone, Copy)]
pub struct BeanContext<'a> {
    pub name: &'a str,
    pub factory: &'a dyn ConfigurableBeanFactory,
}

impl<'a> BeanContext<'a> {
    pub fn new(name: &'a str, factory: &'a dyn ConfigurableBeanFactory) -> Self {
        Self { name, factory }
    }
}
