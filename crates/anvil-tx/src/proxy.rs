//! Auto-proxy creation
//!
//! A single auto-proxy creator is registered under
//! [`AUTO_PROXY_CREATOR_BEAN_NAME`]. Several features may ask for it; each
//! request can only escalate its kind (Infrastructure < AspectJAware <
//! AnnotationAware), never downgrade it.
//!
//! The creator is a decorator. After a bean is initialized it wraps the bean
//! in a [`TransactionalProxy`] when some eligible advisor applies to one of
//! the bean's methods.

use std::sync::Arc;

use anvil_core::{
    Bean, BeanContext, BeanDefinition, BeanDefinitionRegistry, BeanPostProcessor, Capabilities,
    ConfigurableBeanFactory, Error, Ordered, Result, Role, TypeDescriptor, TypeMarkers,
    HIGHEST_PRECEDENCE,
};
use tracing::{debug, trace};

use crate::advisor::{TransactionAttributeSourceAdvisor, ADVISOR};

pub const AUTO_PROXY_CREATOR_BEAN_NAME: &str = "anvil.aop.internalAutoProxyCreator";

const KIND_PROPERTY: &str = "kind";
const PROXY_TARGET_CLASS_PROPERTY: &str = "proxyTargetClass";
const EXPOSE_PROXY_PROPERTY: &str = "exposeProxy";

/// Auto-proxy creator variants, ordered by capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProxyCreatorKind {
    /// Only considers infrastructure advisors
    Infrastructure,
    /// Considers every advisor
    AspectJAware,
    /// Considers every advisor, including annotation-declared aspects
    AnnotationAware,
}

impl ProxyCreatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::AspectJAware => "aspectj-aware",
            Self::AnnotationAware => "annotation-aware",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "infrastructure" => Some(Self::Infrastructure),
            "aspectj-aware" => Some(Self::AspectJAware),
            "annotation-aware" => Some(Self::AnnotationAware),
            _ => None,
        }
    }
}

/// Register the infrastructure auto-proxy creator unless one is present
///
/// Returns `true` if a definition was registered or escalated.
pub fn register_auto_proxy_creator_if_necessary(registry: &dyn BeanDefinitionRegistry) -> Result<bool> {
    register_or_escalate(registry, ProxyCreatorKind::Infrastructure)
}

pub fn register_aspectj_auto_proxy_creator_if_necessary(
    registry: &dyn BeanDefinitionRegistry,
) -> Result<bool> {
    register_or_escalate(registry, ProxyCreatorKind::AspectJAware)
}

pub fn register_aspectj_annotation_auto_proxy_creator_if_necessary(
    registry: &dyn BeanDefinitionRegistry,
) -> Result<bool> {
    register_or_escalate(registry, ProxyCreatorKind::AnnotationAware)
}

fn register_or_escalate(registry: &dyn BeanDefinitionRegistry, kind: ProxyCreatorKind) -> Result<bool> {
    if registry.contains_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME) {
        let existing = registry.bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME)?;
        let current = existing
            .property(KIND_PROPERTY)
            .and_then(ProxyCreatorKind::parse)
            .unwrap_or(ProxyCreatorKind::Infrastructure);
        if current >= kind {
            trace!(current = current.as_str(), requested = kind.as_str(), "Auto-proxy creator already sufficient");
            return Ok(false);
        }
        debug!(from = current.as_str(), to = kind.as_str(), "Escalating auto-proxy creator");
        registry.update_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME, &mut |def| {
            def.set_property(KIND_PROPERTY, kind.as_str());
        })?;
        return Ok(true);
    }

    debug!(kind = kind.as_str(), "Registering auto-proxy creator");
    registry.register_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME, AutoProxyCreator::definition(kind))?;
    Ok(true)
}

/// Make the registered creator proxy target types rather than interfaces
pub fn force_auto_proxy_creator_to_use_class_proxying(registry: &dyn BeanDefinitionRegistry) -> Result<()> {
    set_creator_flag(registry, PROXY_TARGET_CLASS_PROPERTY)
}

/// Make the registered creator expose the current proxy to the target
pub fn force_auto_proxy_creator_to_expose_proxy(registry: &dyn BeanDefinitionRegistry) -> Result<()> {
    set_creator_flag(registry, EXPOSE_PROXY_PROPERTY)
}

fn set_creator_flag(registry: &dyn BeanDefinitionRegistry, flag: &str) -> Result<()> {
    if !registry.contains_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME) {
        return Ok(());
    }
    registry.update_bean_definition(AUTO_PROXY_CREATOR_BEAN_NAME, &mut |def| {
        def.set_property(flag, "true");
    })
}

/// Decorator wrapping advised beans in a [`TransactionalProxy`]
#[derive(Debug)]
pub struct AutoProxyCreator {
    kind: ProxyCreatorKind,
    proxy_target_class: bool,
    expose_proxy: bool,
}

impl AutoProxyCreator {
    pub fn new(kind: ProxyCreatorKind) -> Self {
        Self {
            kind,
            proxy_target_class: false,
            expose_proxy: false,
        }
    }

    /// Definition registered for `kind`; runs ahead of other ordered decorators
    pub fn definition(kind: ProxyCreatorKind) -> BeanDefinition {
        BeanDefinition::new("AutoProxyCreator")
            .with_role(Role::Infrastructure)
            .with_capabilities(Capabilities::BEAN_POST_PROCESSOR)
            .with_order(HIGHEST_PRECEDENCE)
            .with_property(KIND_PROPERTY, kind.as_str())
            .with_supplier(|_, definition| {
                Ok(Bean::bean_post_processor(AutoProxyCreator::from_definition(
                    definition,
                )))
            })
    }

    fn from_definition(definition: &BeanDefinition) -> Self {
        let flag = |key: &str| definition.property(key) == Some("true");
        Self {
            kind: definition
                .property(KIND_PROPERTY)
                .and_then(ProxyCreatorKind::parse)
                .unwrap_or(ProxyCreatorKind::Infrastructure),
            proxy_target_class: flag(PROXY_TARGET_CLASS_PROPERTY),
            expose_proxy: flag(EXPOSE_PROXY_PROPERTY),
        }
    }

    pub fn kind(&self) -> ProxyCreatorKind {
        self.kind
    }

    pub fn is_proxy_target_class(&self) -> bool {
        self.proxy_target_class
    }

    pub fn is_expose_proxy(&self) -> bool {
        self.expose_proxy
    }

    /// Advisors this creator may apply, sorted by order
    ///
    /// Advisors still being created are skipped, as is anything that is not a
    /// transaction advisor. The infrastructure kind only sees advisors with
    /// the infrastructure role.
    fn eligible_advisors(
        &self,
        factory: &dyn ConfigurableBeanFactory,
    ) -> Result<Vec<Arc<TransactionAttributeSourceAdvisor>>> {
        let mut advisors = Vec::new();
        for name in factory.bean_names_for_contract(ADVISOR) {
            if factory.is_currently_in_creation(&name) {
                trace!(advisor = %name, "Skipping advisor currently in creation");
                continue;
            }
            if self.kind == ProxyCreatorKind::Infrastructure && !has_role(factory, &name, Role::Infrastructure) {
                continue;
            }
            if let Some(advisor) = factory.get_bean(&name)?.downcast::<TransactionAttributeSourceAdvisor>() {
                advisors.push(advisor);
            }
        }
        advisors.sort_by_key(|advisor| advisor.order().unwrap_or(i32::MAX));
        Ok(advisors)
    }
}

fn has_role(factory: &dyn ConfigurableBeanFactory, name: &str, role: Role) -> bool {
    factory.contains_bean_definition(name)
        && factory
            .merged_bean_definition(name)
            .map(|definition| definition.role() == role)
            .unwrap_or(false)
}

impl BeanPostProcessor for AutoProxyCreator {
    fn post_process_after_initialization(&self, bean: Bean, ctx: &BeanContext<'_>) -> Result<Bean> {
        if bean.is_bean_post_processor() || has_role(ctx.factory, ctx.name, Role::Infrastructure) {
            return Ok(bean);
        }
        let Some(descriptor) = bean.descriptor() else {
            return Ok(bean);
        };
        if descriptor.has_marker(TypeMarkers::PROXY) || descriptor.has_marker(TypeMarkers::TRANSACTIONAL_PROXY) {
            return Ok(bean);
        }

        let advisors: Vec<_> = self
            .eligible_advisors(ctx.factory)?
            .into_iter()
            .filter(|advisor| advisor.applies_to(descriptor))
            .collect();
        if advisors.is_empty() {
            return Ok(bean);
        }

        debug!(
            bean = ctx.name,
            advisors = advisors.len(),
            class_based = self.proxy_target_class,
            "Creating transactional proxy"
        );
        let target_descriptor = descriptor.clone();
        let proxy_descriptor = descriptor
            .clone()
            .with_markers(TypeMarkers::PROXY | TypeMarkers::TRANSACTIONAL_PROXY);
        let proxy = TransactionalProxy {
            target: bean.clone(),
            target_descriptor,
            advisors,
            class_based: self.proxy_target_class,
            exposed: self.expose_proxy,
        };
        Ok(bean.wrap(proxy, proxy_descriptor))
    }

    fn processor_name(&self) -> &str {
        "AutoProxyCreator"
    }
}

/// Wrapper recording a target bean and the advisors applied to it
pub struct TransactionalProxy {
    target: Bean,
    target_descriptor: TypeDescriptor,
    advisors: Vec<Arc<TransactionAttributeSourceAdvisor>>,
    class_based: bool,
    exposed: bool,
}

impl TransactionalProxy {
    pub fn target(&self) -> &Bean {
        &self.target
    }

    pub fn target_descriptor(&self) -> &TypeDescriptor {
        &self.target_descriptor
    }

    pub fn advisors(&self) -> &[Arc<TransactionAttributeSourceAdvisor>] {
        &self.advisors
    }

    /// Whether the proxy stands in for the target type itself
    pub fn is_class_based(&self) -> bool {
        self.class_based
    }

    pub fn is_exposed(&self) -> bool {
        self.exposed
    }

    /// Invoke `method` on the target through the highest-precedence matching advisor
    pub fn invoke<T>(&self, method: &str, call: impl FnOnce(&Bean) -> Result<T>) -> Result<T> {
        let descriptor = self.target_descriptor.method(method).ok_or_else(|| {
            Error::processor(
                "TransactionalProxy",
                format!("{} has no method '{}'", self.target_descriptor.name(), method),
            )
        })?;
        match self.advisors.first() {
            Some(advisor) => advisor.advise(descriptor, &self.target_descriptor, || call(&self.target)),
            None => call(&self.target),
        }
    }
}
