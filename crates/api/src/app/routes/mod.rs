use axum::{Router, routing::get};

pub mod audit_logs;
pub mod orders;
pub mod products;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/audit-logs", audit_logs::router())
}
