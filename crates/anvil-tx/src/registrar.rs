//! Import registrars that wire the auto-proxy creator from annotation metadata

use anvil_core::{
    AdviceMode, AnnotationMetadata, BeanDefinitionRegistry, ImportRegistrar, Result,
};
use tracing::{debug, warn};

use crate::proxy::{
    force_auto_proxy_creator_to_expose_proxy, force_auto_proxy_creator_to_use_class_proxying,
    register_aspectj_annotation_auto_proxy_creator_if_necessary,
    register_auto_proxy_creator_if_necessary,
};

/// Annotation enabling annotation-declared aspects
pub const ENABLE_ASPECTJ_AUTO_PROXY: &str = "EnableAspectJAutoProxy";

/// Registers the infrastructure auto-proxy creator
///
/// Every annotation on the importing type is inspected. One carrying both a
/// typed `mode` and a typed `proxyTargetClass` attribute is a candidate.
#[derive(Debug, Default)]
pub struct AutoProxyRegistrar;

impl AutoProxyRegistrar {
    pub fn new() -> Self {
        Self
    }
}

impl ImportRegistrar for AutoProxyRegistrar {
    fn register_bean_definitions(
        &self,
        importing: &AnnotationMetadata,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()> {
        let mut candidate_found = false;
        for annotation in importing.annotation_types() {
            let Some(attributes) = importing.attributes_for(annotation) else {
                continue;
            };
            let (Some(mode), Some(proxy_target_class)) = (
                attributes.get_mode("mode"),
                attributes.get_bool("proxyTargetClass"),
            ) else {
                continue;
            };

            candidate_found = true;
            if mode == AdviceMode::Proxy {
                debug!(annotation, "Registering auto-proxy creator for annotation");
                register_auto_proxy_creator_if_necessary(registry)?;
                if proxy_target_class {
                    force_auto_proxy_creator_to_use_class_proxying(registry)?;
                    return Ok(());
                }
            }
        }

        if !candidate_found {
            warn!(
                "AutoProxyRegistrar was imported but no annotations were found having both 'mode' and \
                 'proxyTargetClass' attributes of type AdviceMode and bool respectively. This means that \
                 auto proxy creator registration and configuration may not have occurred as intended, and \
                 components may not be proxied as expected. Check to ensure that AutoProxyRegistrar has \
                 been imported on {} alongside an annotation declaring those attributes.",
                importing.class_name()
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "AutoProxyRegistrar"
    }
}

/// Registers the annotation-aware auto-proxy creator for [`ENABLE_ASPECTJ_AUTO_PROXY`]
#[derive(Debug, Default)]
pub struct AspectJAutoProxyRegistrar;

impl AspectJAutoProxyRegistrar {
    pub fn new() -> Self {
        Self
    }
}

impl ImportRegistrar for AspectJAutoProxyRegistrar {
    fn register_bean_definitions(
        &self,
        importing: &AnnotationMetadata,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Result<()> {
        register_aspectj_annotation_auto_proxy_creator_if_necessary(registry)?;

        if let Some(attributes) = importing.attributes_for(ENABLE_ASPECTJ_AUTO_PROXY) {
            if attributes.get_bool("proxyTargetClass") == Some(true) {
                force_auto_proxy_creator_to_use_class_proxying(registry)?;
            }
            if attributes.get_bool("exposeProxy") == Some(true) {
                force_auto_proxy_creator_to_expose_proxy(registry)?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "AspectJAutoProxyRegistrar"
    }
}
