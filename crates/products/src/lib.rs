//! Product catalog domain module.
//!
//! Catalog records, their field rules, and the stock reservation used by order
//! intake. Pure domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{MAX_RATING, Product, ProductInput, collect_changes};
