//! Transaction advisor: a pointcut paired with the transaction interceptor

use std::sync::Arc;

use anvil_core::{MethodDescriptor, Ordered, Result, TypeDescriptor};

use crate::interceptor::TransactionInterceptor;
use crate::pointcut::{ClassFilter, Pointcut, TransactionAttributeSourcePointcut};
use crate::source::TransactionAttributeSource;

/// Bean name of the advisor registered by transaction management
pub const TRANSACTION_ADVISOR_BEAN_NAME: &str = "anvil.transaction.internalTransactionAdvisor";

/// Contract declared by advisor definitions; the auto-proxy creator looks these up
pub const ADVISOR: &str = "Advisor";

#[derive(Debug, Default)]
pub struct TransactionAttributeSourceAdvisor {
    pointcut: TransactionAttributeSourcePointcut,
    interceptor: Option<Arc<TransactionInterceptor>>,
    order: Option<i32>,
}

impl TransactionAttributeSourceAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source consulted by the pointcut; usually the interceptor's source too
    pub fn with_transaction_attribute_source(
        mut self,
        source: Arc<dyn TransactionAttributeSource>,
    ) -> Self {
        self.pointcut.set_source(source);
        self
    }

    pub fn with_class_filter(mut self, filter: ClassFilter) -> Self {
        self.pointcut = self.pointcut.with_class_filter(filter);
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<TransactionInterceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn pointcut(&self) -> &TransactionAttributeSourcePointcut {
        &self.pointcut
    }

    pub fn interceptor(&self) -> Option<&Arc<TransactionInterceptor>> {
        self.interceptor.as_ref()
    }

    /// Whether the advisor applies to any method of `target`
    pub fn applies_to(&self, target: &TypeDescriptor) -> bool {
        self.pointcut.matches_type(target)
            && target
                .methods()
                .iter()
                .any(|method| self.pointcut.matches(method, Some(target)))
    }

    /// Run `call` through the interceptor when the pointcut matches `method`
    pub fn advise<T>(
        &self,
        method: &MethodDescriptor,
        target: &TypeDescriptor,
        call: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        match &self.interceptor {
            Some(interceptor) if self.pointcut.matches(method, Some(target)) => {
                interceptor.invoke(method, Some(target), call)
            }
            _ => call(),
        }
    }
}

impl Ordered for TransactionAttributeSourceAdvisor {
    fn order(&self) -> Option<i32> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::TRANSACTIONAL;
    use crate::source::AnnotationTransactionAttributeSource;
    use anvil_core::AnnotationAttributes;

    #[test]
    fn test_applies_only_to_types_with_transactional_methods() {
        let advisor = TransactionAttributeSourceAdvisor::new()
            .with_transaction_attribute_source(Arc::new(AnnotationTransactionAttributeSource::new()));

        let pay = TypeDescriptor::new("PayService").with_method_descriptor(
            MethodDescriptor::new("PayService", "pay")
                .with_annotation(TRANSACTIONAL, AnnotationAttributes::new()),
        );
        let report = TypeDescriptor::new("ReportService").with_method("render");

        assert!(advisor.applies_to(&pay));
        assert!(!advisor.applies_to(&report));
    }

    #[test]
    fn test_class_filter_excludes_type() {
        let advisor = TransactionAttributeSourceAdvisor::new()
            .with_class_filter(Arc::new(|t: &TypeDescriptor| t.name() != "PayService"));
        let pay = TypeDescriptor::new("PayService").with_method("pay");
        assert!(!advisor.applies_to(&pay));
    }

    #[test]
    fn test_unset_source_applies_everywhere() {
        let advisor = TransactionAttributeSourceAdvisor::new().with_order(5);
        assert!(advisor.applies_to(&TypeDescriptor::new("Anything").with_method("run")));
        assert_eq!(advisor.order(), Some(5));
    }
}
