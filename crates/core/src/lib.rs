//! `maison-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy, and the clock / ID-generation collaborators
//! that services take as explicit dependencies.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, require_non_blank};
pub use id::{
    AuditLogId, IdGenerator, OrderId, ProductId, SequentialIdGenerator, UuidIdGenerator,
};
