use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_audit_logs).post(create_audit_log))
}

pub async fn list_audit_logs(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.audit.list().await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_audit_log(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateAuditLogRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let entry = match body.into_entry() {
        Ok(entry) => entry,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.audit.record(entry).await {
        Ok(log) => (StatusCode::CREATED, Json(log)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
