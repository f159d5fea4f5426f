use std::sync::Arc;

use tracing::instrument;

use maison_audit::{AuditLog, NewAuditEntry};
use maison_core::{Clock, DomainError, DomainResult, IdGenerator};

use super::finish;
use crate::store::Store;

/// Audit trail reads and manually submitted entries.
#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn Store>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl AuditService {
    pub fn new(store: Arc<dyn Store>, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { store, ids, clock }
    }

    /// Newest first.
    #[instrument(skip(self), err)]
    pub async fn list(&self) -> DomainResult<Vec<AuditLog>> {
        Ok(self.store.list_audit_logs().await?)
    }

    /// Record an entry submitted by a client.
    #[instrument(skip(self, entry), fields(action = %entry.action), err)]
    pub async fn record(&self, entry: NewAuditEntry) -> DomainResult<AuditLog> {
        entry.validate()?;
        let log = entry.stamp(self.ids.as_ref(), self.clock.as_ref());

        let mut tx = self.store.begin().await?;
        let result = tx.append_audit(&log).await.map_err(DomainError::from);
        finish(tx, result).await?;
        Ok(log)
    }

    /// Append `logs` as-is when the trail is empty. Returns how many were inserted.
    #[instrument(skip(self, logs), err)]
    pub async fn seed_if_empty(&self, logs: Vec<AuditLog>) -> DomainResult<usize> {
        if !self.store.list_audit_logs().await?.is_empty() {
            return Ok(0);
        }

        let mut tx = self.store.begin().await?;
        let mut result = Ok(());
        for log in &logs {
            if let Err(e) = tx.append_audit(log).await {
                result = Err(DomainError::from(e));
                break;
            }
        }
        finish(tx, result).await?;

        tracing::info!(count = logs.len(), "demo audit trail seeded");
        Ok(logs.len())
    }
}
