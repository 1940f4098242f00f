//! Transaction interceptor
//!
//! Runs a method call inside a transaction when its attribute source says
//! the method is transactional.

use std::fmt;
use std::sync::Arc;

use anvil_core::{Error, MethodDescriptor, Result, TypeDescriptor};
use tracing::{debug, error, trace};

use crate::manager::PlatformTransactionManager;
use crate::source::TransactionAttributeSource;

/// Bean name of the interceptor registered by transaction management
pub const TRANSACTION_INTERCEPTOR_BEAN_NAME: &str = "transactionInterceptor";

#[derive(Default)]
pub struct TransactionInterceptor {
    source: Option<Arc<dyn TransactionAttributeSource>>,
    manager: Option<Arc<dyn PlatformTransactionManager>>,
}

impl TransactionInterceptor {
    pub fn new(source: Arc<dyn TransactionAttributeSource>) -> Self {
        Self {
            source: Some(source),
            manager: None,
        }
    }

    pub fn with_manager(mut self, manager: Arc<dyn PlatformTransactionManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn source(&self) -> Option<&Arc<dyn TransactionAttributeSource>> {
        self.source.as_ref()
    }

    pub fn has_manager(&self) -> bool {
        self.manager.is_some()
    }

    /// Run `call` for `method`, inside a transaction if the method is transactional
    ///
    /// A successful call commits. A failed call rolls back when the
    /// attribute's rollback rules say so and commits otherwise; either way
    /// the call's own error is returned.
    pub fn invoke<T>(
        &self,
        method: &MethodDescriptor,
        target: Option<&TypeDescriptor>,
        call: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let Some(attribute) = self
            .source
            .as_ref()
            .and_then(|source| source.transaction_attribute(method, target))
        else {
            trace!(method = %method, "Not transactional");
            return call();
        };
        let manager = self.manager.as_ref().ok_or_else(|| {
            Error::processor(
                "TransactionInterceptor",
                format!("no transaction manager available for {}", method),
            )
        })?;

        let name = method.to_string();
        let status = manager.begin(&attribute, &name)?;
        debug!(method = %name, attribute = %attribute, "Began transaction");
        match call() {
            Ok(value) => {
                manager.commit(status)?;
                Ok(value)
            }
            Err(e) => {
                let outcome = if attribute.rollback_on(e.kind()) {
                    manager.rollback(status)
                } else {
                    manager.commit(status)
                };
                if let Err(completion) = outcome {
                    error!(method = %name, error = %completion, "Transaction completion failed; returning application error");
                }
                Err(e)
            }
        }
    }
}

impl fmt::Debug for TransactionInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionInterceptor")
            .field("source", &self.source)
            .field("manager", &self.manager.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{RollbackRule, TransactionAttribute};
    use crate::manager::TransactionStatus;
    use crate::source::NameMatchTransactionAttributeSource;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Journal {
        entries: Mutex<Vec<String>>,
    }

    impl PlatformTransactionManager for Journal {
        fn begin(&self, attribute: &TransactionAttribute, name: &str) -> Result<TransactionStatus> {
            self.entries.lock().push(format!("begin {}", name));
            Ok(TransactionStatus::new(name, attribute))
        }

        fn commit(&self, status: TransactionStatus) -> Result<()> {
            self.entries.lock().push(format!("commit {}", status.name));
            Ok(())
        }

        fn rollback(&self, status: TransactionStatus) -> Result<()> {
            self.entries.lock().push(format!("rollback {}", status.name));
            Ok(())
        }
    }

    fn interceptor(journal: &Arc<Journal>) -> TransactionInterceptor {
        let source = NameMatchTransactionAttributeSource::new()
            .add_method("pay", TransactionAttribute::default())
            .unwrap()
            .add_method(
                "notify",
                TransactionAttribute::default().with_rule(RollbackRule::NoRollbackOn("Processor".into())),
            )
            .unwrap();
        TransactionInterceptor::new(Arc::new(source)).with_manager(journal.clone())
    }

    #[test]
    fn test_success_commits() {
        let journal = Arc::new(Journal::default());
        let pay = MethodDescriptor::new("PayService", "pay");

        let value = interceptor(&journal).invoke(&pay, None, || Ok(42)).unwrap();
        assert_eq!(value, 42);
        assert_eq!(
            *journal.entries.lock(),
            vec!["begin PayService::pay", "commit PayService::pay"]
        );
    }

    #[test]
    fn test_failure_rolls_back_and_keeps_error() {
        let journal = Arc::new(Journal::default());
        let pay = MethodDescriptor::new("PayService", "pay");

        let err = interceptor(&journal)
            .invoke::<()>(&pay, None, || Err(Error::bean_creation("pay", "declined")))
            .unwrap_err();
        assert!(matches!(err, Error::BeanCreation { .. }));
        assert_eq!(
            *journal.entries.lock(),
            vec!["begin PayService::pay", "rollback PayService::pay"]
        );
    }

    #[test]
    fn test_no_rollback_rule_commits_on_failure() {
        let journal = Arc::new(Journal::default());
        let notify = MethodDescriptor::new("PayService", "notify");

        let result = interceptor(&journal)
            .invoke::<()>(&notify, None, || Err(Error::processor("mailer", "offline")));
        assert!(result.is_err());
        assert_eq!(
            *journal.entries.lock(),
            vec!["begin PayService::notify", "commit PayService::notify"]
        );
    }

    #[test]
    fn test_non_transactional_method_bypasses_manager() {
        let journal = Arc::new(Journal::default());
        let balance = MethodDescriptor::new("PayService", "balance");

        interceptor(&journal).invoke(&balance, None, || Ok(())).unwrap();
        assert!(journal.entries.lock().is_empty());
    }

    #[test]
    fn test_missing_manager_is_an_error() {
        let source = NameMatchTransactionAttributeSource::new()
            .add_method("pay", TransactionAttribute::default())
            .unwrap();
        let interceptor = TransactionInterceptor::new(Arc::new(source));
        let pay = MethodDescriptor::new("PayService", "pay");

        let result = interceptor.invoke(&pay, None, || Ok(()));
        assert!(matches!(result, Err(Error::Processor { .. })));
    }
}
