//! Durable form of an order's line items.
//!
//! Items are stored as a JSON array of `{product, quantity}` next to the order
//! row. The product inside each item is a full copy taken at purchase time, so
//! later catalog edits never change what a past order shows.

use maison_core::{DomainError, DomainResult};

use crate::order::CartItem;

/// Serialize a snapshot for storage.
pub fn encode_items(items: &[CartItem]) -> DomainResult<String> {
    serde_json::to_string(items)
        .map_err(|e| DomainError::internal(format!("failed to encode order items: {e}")))
}

/// Decode a stored snapshot.
///
/// Absent or blank input is an empty list. Anything that does not parse means
/// the row was corrupted after it was written and is reported as `Internal`.
pub fn decode_items(raw: Option<&str>) -> DomainResult<Vec<CartItem>> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(Vec::new()),
    };

    serde_json::from_str(raw)
        .map_err(|e| DomainError::internal(format!("failed to decode order items: {e}")))
}
