use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use maison_core::DomainError;

/// Map a domain failure to a JSON error response.
///
/// Internal errors are logged here and replaced by a generic message.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidArgument(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_argument", msg)
        }
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        err @ DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        DomainError::Internal(detail) => {
            tracing::error!(error = %detail, "internal error while handling request");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "internal server error",
            )
        }
    }
}

/// Body could not be read as the expected JSON document.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    tracing::debug!(error = %rejection, "rejected request body");
    json_error(StatusCode::BAD_REQUEST, "invalid_json", "invalid json")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (DomainError::invalid("email is required"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("order ORD-1 not found"), StatusCode::NOT_FOUND),
            (DomainError::insufficient_stock("Aria Accent Chair"), StatusCode::CONFLICT),
            (DomainError::internal("commit failed"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }
}
