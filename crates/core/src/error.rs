//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant except `Internal` is user-correctable and carries a message
/// that is safe to show to the caller. `Internal` details are meant for logs
/// only; transports should replace them with a generic message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing/blank field, non-positive quantity, malformed enum value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown product or order. The message names the missing identifier.
    #[error("{0}")]
    NotFound(String),

    /// Requested quantity exceeds current stock of the named product.
    #[error("insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Persistence, transaction or decoding failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn insufficient_stock(product: impl Into<String>) -> Self {
        Self::InsufficientStock {
            product: product.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures the caller can fix by changing the request.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

/// Trim `value` and reject it when nothing is left.
pub fn require_non_blank(value: &str, field: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_the_product() {
        let err = DomainError::insufficient_stock("Aria Accent Chair");
        assert_eq!(err.to_string(), "insufficient stock for Aria Accent Chair");
        assert!(err.is_user_error());
    }

    #[test]
    fn internal_errors_are_not_user_errors() {
        assert!(!DomainError::internal("commit failed").is_user_error());
    }

    #[test]
    fn require_non_blank_trims_and_rejects_whitespace() {
        assert_eq!(require_non_blank("  Ada  ", "customer").unwrap(), "Ada");
        match require_non_blank(" \t ", "email") {
            Err(DomainError::InvalidArgument(msg)) => assert_eq!(msg, "email is required"),
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}
