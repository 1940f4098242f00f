//! Type-erased bean handles
//!
//! A [`Bean`] wraps a shared instance together with the typed views the
//! container needs (registry/factory post-processor, decorator, listener).
//! Views are captured when the bean is built, so the container can ask for a
//! capability without any runtime type inspection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::Capabilities;
use crate::metadata::TypeDescriptor;
use crate::order::Ordered;
use crate::processor::{
    ApplicationListener, BeanPostProcessor, FactoryPostProcessor, RegistryPostProcessor,
};

/// A shared bean instance with its capability views
#[derive(Clone)]
pub struct Bean {
    object: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    markers: Capabilities,
    order: Option<i32>,
    descriptor: Option<Arc<TypeDescriptor>>,
    registry_post_processor: Option<Arc<dyn RegistryPostProcessor>>,
    factory_post_processor: Option<Arc<dyn FactoryPostProcessor>>,
    bean_post_processor: Option<Arc<dyn BeanPostProcessor>>,
    listener: Option<Arc<dyn ApplicationListener>>,
}

impl Bean {
    /// Wrap a plain value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wrap an already shared value
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            object: value,
            type_name: std::any::type_name::<T>(),
            markers: Capabilities::empty(),
            order: None,
            descriptor: None,
            registry_post_processor: None,
            factory_post_processor: None,
            bean_post_processor: None,
            listener: None,
        }
    }

    /// Wrap a registry post-processor; it is also exposed as a factory post-processor
    pub fn registry_post_processor<T>(value: T) -> Self
    where
        T: RegistryPostProcessor + Any,
    {
        let value = Arc::new(value);
        let mut bean = Self::from_arc(value.clone());
        bean.registry_post_processor = Some(value.clone());
        bean.factory_post_processor = Some(value);
        bean
    }

    /// Wrap a factory post-processor
    pub fn factory_post_processor<T>(value: T) -> Self
    where
        T: FactoryPostProcessor + Any,
    {
        let value = Arc::new(value);
        Self::from_arc(value.clone()).with_factory_post_processor(value)
    }

    /// Wrap a decorator
    pub fn bean_post_processor<T>(value: T) -> Self
    where
        T: BeanPostProcessor + Any,
    {
        let value = Arc::new(value);
        Self::from_arc(value.clone()).with_bean_post_processor(value)
    }

    /// Wrap an application listener
    pub fn listener<T>(value: T) -> Self
    where
        T: ApplicationListener + Any,
    {
        let value = Arc::new(value);
        Self::from_arc(value.clone()).with_listener(value)
    }

    /// Expose an additional factory post-processor view
    pub fn with_factory_post_processor(mut self, processor: Arc<dyn FactoryPostProcessor>) -> Self {
        self.factory_post_processor = Some(processor);
        self
    }

    /// Expose an additional registry post-processor view
    pub fn with_registry_post_processor(
        mut self,
        processor: Arc<dyn RegistryPostProcessor>,
    ) -> Self {
        self.registry_post_processor = Some(processor);
        self
    }

    /// Expose an additional decorator view
    pub fn with_bean_post_processor(mut self, processor: Arc<dyn BeanPostProcessor>) -> Self {
        self.bean_post_processor = Some(processor);
        self
    }

    /// Expose an additional listener view
    pub fn with_listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Set an explicit order value (marks the bean `ORDERED`)
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self.markers |= Capabilities::ORDERED;
        self
    }

    /// Set an explicit priority order value (marks the bean `PRIORITY_ORDERED`)
    pub fn with_priority_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self.markers |= Capabilities::PRIORITY_ORDERED | Capabilities::ORDERED;
        self
    }

    /// Adopt ordering declared on the definition unless the bean declared its own
    pub fn inherit_ordering(mut self, markers: Capabilities, order: Option<i32>) -> Self {
        self.markers |= markers & (Capabilities::PRIORITY_ORDERED | Capabilities::ORDERED);
        if self.order.is_none() {
            self.order = order;
        }
        self
    }

    /// Attach runtime type metadata
    pub fn with_descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptor = Some(Arc::new(descriptor));
        self
    }

    /// Replace the instance, keeping every capability view of `self`
    ///
    /// Used by decorators that wrap a bean, e.g. in a proxy.
    pub fn wrap<T: Any + Send + Sync>(&self, wrapper: T, descriptor: TypeDescriptor) -> Self {
        let mut wrapped = self.clone();
        wrapped.object = Arc::new(wrapper);
        wrapped.type_name = std::any::type_name::<T>();
        wrapped.descriptor = Some(Arc::new(descriptor));
        wrapped
    }

    /// Capabilities exposed by this instance
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = self.markers;
        if self.registry_post_processor.is_some() {
            caps |= Capabilities::REGISTRY_POST_PROCESSOR;
        }
        if self.factory_post_processor.is_some() {
            caps |= Capabilities::FACTORY_POST_PROCESSOR;
        }
        if let Some(processor) = &self.bean_post_processor {
            caps |= Capabilities::BEAN_POST_PROCESSOR;
            if processor.as_merged_definition_processor().is_some() {
                caps |= Capabilities::MERGED_DEFINITION;
            }
        }
        if self.listener.is_some() {
            caps |= Capabilities::APPLICATION_LISTENER;
        }
        caps
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn descriptor(&self) -> Option<&TypeDescriptor> {
        self.descriptor.as_deref()
    }

    pub fn registry_post_processor_view(&self) -> Option<Arc<dyn RegistryPostProcessor>> {
        self.registry_post_processor.clone()
    }

    pub fn factory_post_processor_view(&self) -> Option<Arc<dyn FactoryPostProcessor>> {
        self.factory_post_processor.clone()
    }

    pub fn bean_post_processor_view(&self) -> Option<Arc<dyn BeanPostProcessor>> {
        self.bean_post_processor.clone()
    }

    pub fn listener_view(&self) -> Option<Arc<dyn ApplicationListener>> {
        self.listener.clone()
    }

    pub fn is_bean_post_processor(&self) -> bool {
        self.bean_post_processor.is_some()
    }

    /// Recover the concrete instance
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    /// Whether both handles share the same instance
    pub fn ptr_eq(&self, other: &Bean) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl Ordered for Bean {
    fn order(&self) -> Option<i32> {
        self.order
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities())
            .field("order", &self.order)
            .finish()
    }
}
