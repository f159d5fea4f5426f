//! Infrastructure layer: storage, transactions, services, config.

pub mod config;
pub mod seed;
pub mod services;
pub mod store;

mod integration_tests;

pub use config::{AppConfig, ConfigError};
pub use services::{AuditService, CatalogService, OrderService};
pub use store::{FailurePoint, InMemoryStore, PostgresStore, Store, StoreError, StoreTx};
