//! Default bean factory
//!
//! Definitions are kept in registration order. All state sits behind
//! `parking_lot` locks that are released before any supplier, decorator or
//! post-processor runs, so user code may call back into the factory.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anvil_core::{
    Bean, BeanContext, BeanDefinition, BeanDefinitionRegistry, BeanPostProcessor, Capabilities,
    ConfigurableBeanFactory, Error, OrderComparator, Result, Role,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use crate::chain::DecoratorChain;

/// Bean factory backed by an ordered definition map
pub struct DefaultListableBeanFactory {
    definitions: RwLock<IndexMap<String, BeanDefinition>>,
    merged: RwLock<HashMap<String, BeanDefinition>>,
    capability_cache: RwLock<HashMap<Capabilities, Vec<String>>>,
    singletons: RwLock<IndexMap<String, Bean>>,
    in_creation: Mutex<HashSet<String>>,
    chain: Arc<DecoratorChain>,
    comparator: RwLock<Option<Arc<dyn OrderComparator>>>,
    allow_definition_overriding: AtomicBool,
}

impl DefaultListableBeanFactory {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(IndexMap::new()),
            merged: RwLock::new(HashMap::new()),
            capability_cache: RwLock::new(HashMap::new()),
            singletons: RwLock::new(IndexMap::new()),
            in_creation: Mutex::new(HashSet::new()),
            chain: Arc::new(DecoratorChain::new()),
            comparator: RwLock::new(None),
            allow_definition_overriding: AtomicBool::new(true),
        }
    }

    pub fn set_allow_definition_overriding(&self, allow: bool) {
        self.allow_definition_overriding.store(allow, Ordering::Relaxed);
    }

    pub fn is_allow_definition_overriding(&self) -> bool {
        self.allow_definition_overriding.load(Ordering::Relaxed)
    }

    /// Install the comparator used to sort processors within a tier
    pub fn set_dependency_comparator(&self, comparator: Arc<dyn OrderComparator>) {
        *self.comparator.write() = Some(comparator);
    }

    /// Shared handle to the installed decorator chain
    pub fn decorator_chain(&self) -> Arc<DecoratorChain> {
        self.chain.clone()
    }

    pub fn remove_bean_post_processor(&self, processor: &Arc<dyn BeanPostProcessor>) -> bool {
        self.chain.remove(processor)
    }

    /// Names of instantiated singletons in creation order
    pub fn singleton_names(&self) -> Vec<String> {
        self.singletons.read().keys().cloned().collect()
    }

    /// Create every non-lazy, non-abstract singleton in registration order
    pub fn pre_instantiate_singletons(&self) -> Result<usize> {
        let names = self.bean_definition_names();
        let mut created = 0;
        for name in names {
            let merged = self.merged_bean_definition(&name)?;
            if merged.is_abstract() || !merged.is_singleton() || merged.is_lazy_init() {
                continue;
            }
            if !self.contains_singleton(&name) {
                self.get_bean(&name)?;
                created += 1;
            }
        }
        debug!(created, "Pre-instantiated singletons");
        Ok(created)
    }

    /// Drop every cached singleton, newest first
    pub fn destroy_singletons(&self) {
        let mut singletons = self.singletons.write();
        let count = singletons.len();
        while singletons.pop().is_some() {}
        drop(singletons);
        self.capability_cache.write().clear();
        debug!(count, "Destroyed singletons");
    }

    fn invalidate_caches(&self) {
        self.merged.write().clear();
        self.capability_cache.write().clear();
    }

    /// Resolve the parent chain of `name` and fold it root-first
    fn merge_definition(&self, name: &str) -> Result<BeanDefinition> {
        let definitions = self.definitions.read();
        let mut lineage = Vec::new();
        let mut seen = HashSet::new();
        let mut current = name.to_string();
        loop {
            if !seen.insert(current.clone()) {
                return Err(Error::invalid_config(format!(
                    "Circular parent chain for bean definition '{}'",
                    name
                )));
            }
            let def = definitions
                .get(&current)
                .ok_or_else(|| Error::no_such_bean(current.clone()))?;
            lineage.push(def.clone());
            match def.parent() {
                Some(parent) => current = parent.to_string(),
                None => break,
            }
        }
        drop(definitions);

        let mut iter = lineage.into_iter().rev();
        let mut merged = match iter.next() {
            Some(root) => root,
            None => return Err(Error::no_such_bean(name)),
        };
        for child in iter {
            merged = child.merged_with_parent(&merged);
        }
        Ok(merged)
    }

    fn create_bean(&self, name: &str, definition: &BeanDefinition) -> Result<Bean> {
        for dependency in definition.dependencies() {
            trace!(bean = name, dependency = %dependency, "Creating dependency first");
            self.get_bean(dependency)?;
        }

        let supplier = definition.supplier().cloned().ok_or_else(|| {
            Error::bean_creation(name, "bean definition has no instance supplier")
        })?;
        let bean = supplier(self as &dyn ConfigurableBeanFactory, definition)?
            .inherit_ordering(definition.capabilities(), definition.order());

        let chain = self.chain.snapshot();
        for processor in chain.iter() {
            if let Some(merged) = processor.as_merged_definition_processor() {
                merged.post_process_merged_bean_definition(definition, name)?;
            }
        }

        let ctx = BeanContext::new(name, self);
        let mut bean = bean;
        for processor in chain.iter() {
            bean = processor.post_process_before_initialization(bean, &ctx)?;
        }
        for processor in chain.iter() {
            bean = processor.post_process_after_initialization(bean, &ctx)?;
        }
        Ok(bean)
    }

    fn names_matching(&self, capability: Capabilities) -> Vec<String> {
        let names = self.bean_definition_names();
        let mut matching = Vec::new();
        for name in &names {
            match self.merged_bean_definition(name) {
                Ok(def) if !def.is_abstract() && def.capabilities().contains(capability) => {
                    matching.push(name.clone());
                }
                Ok(_) => {}
                Err(e) => debug!(bean = %name, error = %e, "Skipping unresolvable definition"),
            }
        }
        // manually registered singletons without a definition
        let singletons = self.singletons.read();
        for (name, bean) in singletons.iter() {
            if !names.contains(name) && bean.capabilities().contains(capability) {
                matching.push(name.clone());
            }
        }
        matching
    }
}

impl Default for DefaultListableBeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanDefinitionRegistry for DefaultListableBeanFactory {
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition) -> Result<()> {
        {
            let mut definitions = self.definitions.write();
            if let Some(existing) = definitions.get(name) {
                if !self.is_allow_definition_overriding() {
                    return Err(Error::definition_override(name));
                }
                info!(
                    "Overriding bean definition for bean '{}': replacing [{}] with [{}]",
                    name,
                    existing.type_name(),
                    definition.type_name()
                );
                self.singletons.write().shift_remove(name);
            } else {
                debug!(bean = name, type_name = definition.type_name(), "Registered bean definition");
            }
            definitions.insert(name.to_string(), definition);
        }
        self.invalidate_caches();
        Ok(())
    }

    fn remove_bean_definition(&self, name: &str) -> Result<BeanDefinition> {
        let removed = self
            .definitions
            .write()
            .shift_remove(name)
            .ok_or_else(|| Error::no_such_bean(name))?;
        self.singletons.write().shift_remove(name);
        self.invalidate_caches();
        Ok(removed)
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    fn bean_definition(&self, name: &str) -> Result<BeanDefinition> {
        self.definitions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::no_such_bean(name))
    }

    fn bean_definition_names(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }

    fn bean_definition_count(&self) -> usize {
        self.definitions.read().len()
    }

    fn bean_names_for_capability(&self, capability: Capabilities) -> Vec<String> {
        if let Some(cached) = self.capability_cache.read().get(&capability) {
            return cached.clone();
        }
        let names = self.names_matching(capability);
        self.capability_cache
            .write()
            .insert(capability, names.clone());
        names
    }

    fn bean_names_for_contract(&self, contract: &str) -> Vec<String> {
        self.bean_definition_names()
            .into_iter()
            .filter(|name| {
                self.merged_bean_definition(name)
                    .map(|def| !def.is_abstract() && def.fulfils(contract))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn update_bean_definition(
        &self,
        name: &str,
        update: &mut dyn FnMut(&mut BeanDefinition),
    ) -> Result<()> {
        let mut definition = self.bean_definition(name)?;
        update(&mut definition);
        match self.definitions.write().get_mut(name) {
            Some(slot) => *slot = definition,
            None => return Err(Error::no_such_bean(name)),
        }
        self.invalidate_caches();
        Ok(())
    }

    fn clear_metadata_cache(&self) {
        trace!("Clearing merged definition cache");
        self.invalidate_caches();
    }
}

impl ConfigurableBeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> Result<Bean> {
        if let Some(bean) = self.singletons.read().get(name) {
            return Ok(bean.clone());
        }

        let definition = self.merged_bean_definition(name)?;
        if definition.is_abstract() {
            return Err(Error::abstract_definition(name));
        }

        if !self.in_creation.lock().insert(name.to_string()) {
            return Err(Error::currently_in_creation(name));
        }
        trace!(bean = name, "Creating bean");
        let created = self.create_bean(name, &definition);
        self.in_creation.lock().remove(name);
        let bean = created?;

        if definition.is_singleton() {
            let mut singletons = self.singletons.write();
            return Ok(singletons.entry(name.to_string()).or_insert(bean).clone());
        }
        Ok(bean)
    }

    fn is_type_match(&self, name: &str, capability: Capabilities) -> bool {
        let declared = self
            .merged_bean_definition(name)
            .map(|def| def.capabilities())
            .unwrap_or_default();
        if declared.contains(capability) {
            return true;
        }
        self.singletons
            .read()
            .get(name)
            .map(|bean| bean.capabilities().contains(capability))
            .unwrap_or(false)
    }

    fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    fn register_singleton(&self, name: &str, bean: Bean) -> Result<()> {
        {
            let mut singletons = self.singletons.write();
            if singletons.contains_key(name) {
                return Err(Error::singleton_exists(name));
            }
            singletons.insert(name.to_string(), bean);
        }
        self.capability_cache.write().clear();
        debug!(bean = name, "Registered singleton");
        Ok(())
    }

    fn is_currently_in_creation(&self, name: &str) -> bool {
        self.in_creation.lock().contains(name)
    }

    fn add_bean_post_processor(&self, processor: Arc<dyn BeanPostProcessor>) {
        self.chain.add(processor);
    }

    fn bean_post_processor_count(&self) -> usize {
        self.chain.len()
    }

    fn dependency_comparator(&self) -> Option<Arc<dyn OrderComparator>> {
        self.comparator.read().clone()
    }

    fn merged_bean_definition(&self, name: &str) -> Result<BeanDefinition> {
        if let Some(def) = self.merged.read().get(name) {
            return Ok(def.clone());
        }
        let merged = self.merge_definition(name)?;
        self.merged.write().insert(name.to_string(), merged.clone());
        Ok(merged)
    }
}

/// Whether `name` is defined with the infrastructure role
pub(crate) fn is_infrastructure(factory: &dyn ConfigurableBeanFactory, name: &str) -> bool {
    factory.contains_bean_definition(name)
        && factory
            .merged_bean_definition(name)
            .map(|def| def.role() == Role::Infrastructure)
            .unwrap_or(false)
}
