//! Audit trail domain module.
//!
//! Append-only records of state-changing events. Entries are written inside
//! the transaction of the operation they describe and are never read back by
//! business logic.

pub mod entry;

pub use entry::{
    AuditCategory, AuditLog, AuditSeverity, NewAuditEntry, SYSTEM_ADMIN_ACTOR,
};
