//! Transactional storage boundary.
//!
//! Services never touch a database directly. They open a [`StoreTx`] with
//! [`Store::begin`], do all reads and writes of one request through it, then
//! commit. Dropping or rolling back a transaction discards every write made
//! through it.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use maison_audit::AuditLog;
use maison_core::{DomainError, OrderId, ProductId};
use maison_products::Product;
use maison_sales::Order;

pub use in_memory::{FailurePoint, InMemoryStore};
pub use postgres::PostgresStore;

/// Storage failure.
///
/// These are infrastructure errors. Business rule violations are
/// `DomainError`s raised by the services before anything is written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("duplicate key in {operation}: {message}")]
    Conflict { operation: String, message: String },

    #[error("failed to decode {entity} row: {message}")]
    Decode { entity: &'static str, message: String },

    #[error("injected failure at {0:?}")]
    Injected(FailurePoint),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        DomainError::internal(err.to_string())
    }
}

/// Handle to a store. Cheap to share between request tasks.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction scoped to one request.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;

    /// All products, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// All audit entries, newest first.
    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, StoreError>;
}

/// Unit of work.
///
/// `find_*` methods lock the row they return until commit or rollback, so a
/// concurrent transaction reading the same product waits instead of reading a
/// stale stock level.
#[async_trait]
pub trait StoreTx: Send {
    async fn find_product(&mut self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    async fn insert_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Overwrite an existing product row.
    async fn save_product(&mut self, product: &Product) -> Result<(), StoreError>;

    /// Returns `false` when no row had that id.
    async fn delete_product(&mut self, id: &ProductId) -> Result<bool, StoreError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Persist the current status of `order`. No other column changes.
    async fn save_order_status(&mut self, order: &Order) -> Result<(), StoreError>;

    async fn append_audit(&mut self, entry: &AuditLog) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
