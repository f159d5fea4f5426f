//! Application services.
//!
//! Each public operation runs in exactly one store transaction. Business rule
//! failures, store failures and audit failures all roll the whole operation
//! back.

pub mod audit_log;
pub mod catalog;
pub mod orders;

pub use audit_log::AuditService;
pub use catalog::CatalogService;
pub use orders::OrderService;

use maison_core::DomainResult;

use crate::store::StoreTx;

/// Commit on success, roll back on failure.
///
/// A failed rollback is logged; the original error is returned.
pub(crate) async fn finish<T>(tx: Box<dyn StoreTx>, result: DomainResult<T>) -> DomainResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
