use axum::{
    Router,
    extract::rejection::{JsonRejection, QueryRejection},
    routing::get,
};

use crate::app::errors;

pub mod aggregations;
pub mod indices;
pub mod items;
pub mod search;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/health/engine", get(system::engine_health))
        .nest("/indices", indices::router())
        .nest("/items", items::router())
        .nest("/search", search::router())
        .nest("/aggregations", aggregations::router())
}

/// Malformed query strings get the same JSON error body as every other 400.
pub(crate) fn query_rejection(e: QueryRejection) -> axum::response::Response {
    errors::json_error(e.status(), "invalid_query", e.body_text())
}

pub(crate) fn json_rejection(e: JsonRejection) -> axum::response::Response {
    errors::json_error(e.status(), "invalid_body", e.body_text())
}
