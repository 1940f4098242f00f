//! Transaction manager boundary
//!
//! Transaction semantics live behind [`PlatformTransactionManager`]; the
//! container only begins, commits and rolls back through it. Managers and
//! configurers are stored in the container as shared trait objects.

use std::sync::Arc;

use anvil_core::{Bean, Result};

use crate::attribute::TransactionAttribute;

/// Contract declared by transaction manager definitions
pub const PLATFORM_TRANSACTION_MANAGER: &str = "PlatformTransactionManager";

/// Contract declared by transaction-management configurer definitions
pub const TRANSACTION_MANAGEMENT_CONFIGURER: &str = "TransactionManagementConfigurer";

/// Handle for a transaction begun by a manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    /// Method the transaction was begun for
    pub name: String,
    pub new_transaction: bool,
    pub read_only: bool,
}

impl TransactionStatus {
    pub fn new(name: &str, attribute: &TransactionAttribute) -> Self {
        Self {
            name: name.to_string(),
            new_transaction: true,
            read_only: attribute.read_only,
        }
    }
}

pub trait PlatformTransactionManager: Send + Sync {
    fn begin(&self, attribute: &TransactionAttribute, name: &str) -> Result<TransactionStatus>;

    fn commit(&self, status: TransactionStatus) -> Result<()>;

    fn rollback(&self, status: TransactionStatus) -> Result<()>;
}

/// Supplies the transaction manager used by annotation-driven transactions
///
/// At most one configurer may be defined.
pub trait TransactionManagementConfigurer: Send + Sync {
    fn annotation_driven_transaction_manager(&self) -> Arc<dyn PlatformTransactionManager>;
}

pub fn transaction_manager_bean(manager: Arc<dyn PlatformTransactionManager>) -> Bean {
    Bean::new(manager)
}

pub fn transaction_manager_of(bean: &Bean) -> Option<Arc<dyn PlatformTransactionManager>> {
    bean.downcast::<Arc<dyn PlatformTransactionManager>>()
        .map(|manager| manager.as_ref().clone())
}

pub fn configurer_bean(configurer: Arc<dyn TransactionManagementConfigurer>) -> Bean {
    Bean::new(configurer)
}

pub fn configurer_of(bean: &Bean) -> Option<Arc<dyn TransactionManagementConfigurer>> {
    bean.downcast::<Arc<dyn TransactionManagementConfigurer>>()
        .map(|configurer| configurer.as_ref().clone())
}
