use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use itemsearch_core::Item;
use itemsearch_search::Document;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route(
        "/",
        get(index_status).post(create_index).delete(delete_index),
    )
}

pub async fn create_index(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let created = match services.indices.create_index::<Item>().await {
        Ok(created) => created,
        Err(e) => return errors::search_error_to_response(e),
    };
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(serde_json::json!({ "index": Item::INDEX, "created": created })),
    )
        .into_response()
}

pub async fn delete_index(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.indices.delete_index::<Item>().await {
        Ok(deleted) => {
            Json(serde_json::json!({ "index": Item::INDEX, "deleted": deleted })).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

/// Existence, mapping and document count of the item index.
pub async fn index_status(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let exists = match services.indices.index_exists::<Item>().await {
        Ok(exists) => exists,
        Err(e) => return errors::search_error_to_response(e),
    };
    if !exists {
        return Json(dto::IndexStatus {
            index: Item::INDEX,
            exists,
            mapping: None,
            document_count: None,
        })
        .into_response();
    }

    let mapping = match services.indices.get_mapping::<Item>().await {
        Ok(m) => m,
        Err(e) => return errors::search_error_to_response(e),
    };
    let count = match services.items.count().await {
        Ok(n) => n,
        Err(e) => return errors::search_error_to_response(e),
    };
    Json(dto::IndexStatus {
        index: Item::INDEX,
        exists,
        mapping: Some(mapping),
        document_count: Some(count),
    })
    .into_response()
}
