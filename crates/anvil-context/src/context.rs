//! Application context
//!
//! Owns a bean factory and drives the bootstrap pipeline on refresh.

use std::any::Any;
use std::sync::Arc;

use anvil_core::{
    ApplicationEvent, Bean, BeanDefinition, BeanDefinitionRegistry, BootstrapConfig,
    BootstrapObserver, Capabilities, ConfigurableBeanFactory, Error, OrderComparator, Result,
    Role, SuppliedPostProcessor, TracingObserver,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::bootstrap::PostProcessorDelegate;
use crate::configuration::{ConfigurationProcessor, CONFIGURATION_PROCESSOR_BEAN_NAME};
use crate::detector::ApplicationListenerDetector;
use crate::events::EventMulticaster;
use crate::factory::DefaultListableBeanFactory;
use crate::placeholder::{
    PropertyPlaceholderConfigurer, PLACEHOLDER_CONFIGURER_BEAN_NAME, PLACEHOLDER_CONFIGURER_ORDER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Refreshing,
    Active,
    Closed,
    Failed,
}

/// A bean factory plus its lifecycle: refresh once, use, close
pub struct ApplicationContext {
    config: BootstrapConfig,
    factory: DefaultListableBeanFactory,
    multicaster: Arc<EventMulticaster>,
    detector: Arc<ApplicationListenerDetector>,
    supplied: Mutex<Vec<SuppliedPostProcessor>>,
    observer: Arc<dyn BootstrapObserver>,
    state: Mutex<State>,
}

impl ApplicationContext {
    /// Create a context with the internal infrastructure beans registered
    pub fn new(config: BootstrapConfig) -> Result<Self> {
        let factory = DefaultListableBeanFactory::new();
        factory.set_allow_definition_overriding(config.allow_definition_overriding);

        factory.register_bean_definition(
            CONFIGURATION_PROCESSOR_BEAN_NAME,
            ConfigurationProcessor::definition(),
        )?;

        let configurer = PropertyPlaceholderConfigurer::from_config(&config);
        factory.register_bean_definition(
            PLACEHOLDER_CONFIGURER_BEAN_NAME,
            BeanDefinition::new("PropertyPlaceholderConfigurer")
                .with_role(Role::Infrastructure)
                .with_capabilities(Capabilities::FACTORY_POST_PROCESSOR)
                .with_priority_order(PLACEHOLDER_CONFIGURER_ORDER)
                .with_instance(move || Bean::factory_post_processor(configurer.clone())),
        )?;

        let multicaster = Arc::new(EventMulticaster::new());
        let detector = Arc::new(ApplicationListenerDetector::new(multicaster.clone()));

        Ok(Self {
            config,
            factory,
            multicaster,
            detector,
            supplied: Mutex::new(Vec::new()),
            observer: Arc::new(TracingObserver),
            state: Mutex::new(State::Created),
        })
    }

    /// Replace the observer receiving bootstrap events
    pub fn with_observer(mut self, observer: Arc<dyn BootstrapObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn factory(&self) -> &DefaultListableBeanFactory {
        &self.factory
    }

    pub fn multicaster(&self) -> &Arc<EventMulticaster> {
        &self.multicaster
    }

    pub fn register(&self, name: &str, definition: BeanDefinition) -> Result<()> {
        self.factory.register_bean_definition(name, definition)
    }

    pub fn register_singleton(&self, name: &str, bean: Bean) -> Result<()> {
        self.factory.register_singleton(name, bean)
    }

    /// Add an already-instantiated post-processor run ahead of looked-up ones
    pub fn add_bean_factory_post_processor(&self, processor: SuppliedPostProcessor) {
        self.supplied.lock().push(processor);
    }

    pub fn set_dependency_comparator(&self, comparator: Arc<dyn OrderComparator>) {
        self.factory.set_dependency_comparator(comparator);
    }

    /// Bootstrap the container
    ///
    /// May be called once. On failure every created singleton is destroyed
    /// and the error is returned unchanged.
    pub fn refresh(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if *state != State::Created {
                return Err(Error::context_state(
                    "refresh may only be called once on an application context",
                ));
            }
            *state = State::Refreshing;
        }

        match self.do_refresh() {
            Ok(()) => {
                info!(
                    beans = self.factory.bean_definition_count(),
                    decorators = self.factory.bean_post_processor_count(),
                    "Application context refreshed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Context refresh failed; destroying singletons");
                self.factory.destroy_singletons();
                self.multicaster.clear();
                *self.state.lock() = State::Failed;
                Err(e)
            }
        }
    }

    fn do_refresh(&self) -> Result<()> {
        // Listener detection is in place before any bean is created
        self.factory.add_bean_post_processor(self.detector.clone());

        let delegate =
            PostProcessorDelegate::new(&self.config).with_observer(self.observer.clone());
        let supplied = self.supplied.lock().clone();
        delegate.invoke_bean_factory_post_processors(&self.factory, &supplied)?;
        delegate.register_bean_post_processors(&self.factory, self.detector.clone())?;

        self.register_listeners();
        self.factory.pre_instantiate_singletons()?;

        *self.state.lock() = State::Active;
        self.multicaster.multicast(&ApplicationEvent::ContextRefreshed {
            bean_count: self.factory.bean_definition_count(),
        })
    }

    /// Hand listeners created before the detector saw them to the multicaster
    fn register_listeners(&self) {
        for name in self
            .factory
            .bean_names_for_capability(Capabilities::APPLICATION_LISTENER)
        {
            if !self.factory.contains_singleton(&name) {
                continue;
            }
            if let Ok(bean) = self.factory.get_bean(&name) {
                if let Some(listener) = bean.listener_view() {
                    if self.multicaster.add_listener(&name, listener) {
                        debug!(listener = %name, "Registered early application listener");
                    }
                }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        *self.state.lock() == State::Active
    }

    fn assert_active(&self) -> Result<()> {
        match *self.state.lock() {
            State::Active => Ok(()),
            State::Closed => Err(Error::context_state("application context has been closed")),
            _ => Err(Error::context_state(
                "application context has not been refreshed yet",
            )),
        }
    }

    pub fn get_bean(&self, name: &str) -> Result<Bean> {
        self.assert_active()?;
        self.factory.get_bean(name)
    }

    /// Obtain a bean as its concrete type
    pub fn get_bean_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let bean = self.get_bean(name)?;
        bean.downcast::<T>()
            .ok_or_else(|| Error::not_of_required_capability(name, std::any::type_name::<T>()))
    }

    pub fn publish_event(&self, event: ApplicationEvent) -> Result<()> {
        self.assert_active()?;
        self.multicaster.multicast(&event)
    }

    /// Publish `ContextClosed` and destroy every singleton
    pub fn close(&self) -> Result<()> {
        self.assert_active()?;
        let published = self.multicaster.multicast(&ApplicationEvent::ContextClosed);
        self.factory.destroy_singletons();
        self.multicaster.clear();
        *self.state.lock() = State::Closed;
        info!("Application context closed");
        published
    }
}
