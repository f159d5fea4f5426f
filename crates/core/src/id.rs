//! Strongly-typed identifiers and identifier generation.
//!
//! Identifiers are opaque strings (`p2`, `ORD-…`, `log-…`) so that catalog
//! entries created by hand and generated ones share one representation.

use core::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of an order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

/// Identifier of an audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLogId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap an already-validated identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid(format!("{} cannot be blank", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(ProductId, "product id");
impl_string_newtype!(OrderId, "order id");
impl_string_newtype!(AuditLogId, "audit log id");

/// Prefix used for generated order identifiers.
pub const ORDER_ID_PREFIX: &str = "ORD";
/// Prefix used for generated audit log identifiers.
pub const AUDIT_LOG_ID_PREFIX: &str = "log";
/// Prefix used for generated product identifiers.
pub const PRODUCT_ID_PREFIX: &str = "p";

/// Source of fresh identifiers.
///
/// Injected into services so tests can produce deterministic IDs.
pub trait IdGenerator: Send + Sync {
    /// Return a new identifier of the form `{prefix}-{unique}`.
    fn next_id(&self, prefix: &str) -> String;

    fn order_id(&self) -> OrderId {
        OrderId::new(self.next_id(ORDER_ID_PREFIX))
    }

    fn audit_log_id(&self) -> AuditLogId {
        AuditLogId::new(self.next_id(AUDIT_LOG_ID_PREFIX))
    }

    fn product_id(&self) -> ProductId {
        ProductId::new(self.next_id(PRODUCT_ID_PREFIX))
    }
}

impl<G> IdGenerator for std::sync::Arc<G>
where
    G: IdGenerator + ?Sized,
{
    fn next_id(&self, prefix: &str) -> String {
        (**self).next_id(prefix)
    }
}

/// Production generator: UUIDv7 (time-ordered), hex without dashes.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::now_v7().simple())
    }
}

/// Deterministic generator for tests: `ORD-1`, `log-2`, `ORD-3`, …
///
/// The counter is shared across prefixes.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_trims_and_rejects_blank() {
        let id: ProductId = "  p2 ".parse().unwrap();
        assert_eq!(id.as_str(), "p2");
        assert!("   ".parse::<OrderId>().is_err());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OrderId::new("ORD-7")).unwrap();
        assert_eq!(json, "\"ORD-7\"");
    }

    #[test]
    fn sequential_generator_is_deterministic() {
        let ids = SequentialIdGenerator::new();
        assert_eq!(ids.order_id().as_str(), "ORD-1");
        assert_eq!(ids.audit_log_id().as_str(), "log-2");
        assert_eq!(ids.product_id().as_str(), "p-3");
    }

    #[test]
    fn uuid_generator_produces_unique_prefixed_ids() {
        let ids = UuidIdGenerator;
        let generated: HashSet<String> = (0..1000).map(|_| ids.next_id("ORD")).collect();
        assert_eq!(generated.len(), 1000);
        assert!(generated.iter().all(|id| id.starts_with("ORD-")));
    }
}
