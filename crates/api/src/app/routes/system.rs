use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use itemsearch_search::SearchBackend;

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Cluster health as reported by the engine.
pub async fn engine_health(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.backend().health().await {
        Ok(health) => Json(health).into_response(),
        Err(e) => errors::search_error_to_response(e),
    }
}
