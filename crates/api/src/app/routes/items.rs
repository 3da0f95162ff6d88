use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use itemsearch_core::{Item, ItemId, sample_catalog};
use itemsearch_search::SearchError;

use crate::app::routes::{json_rejection, query_rejection};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(save_item).get(list_items))
        .route("/bulk", post(save_items))
        .route("/seed", post(seed_items))
        .route("/by-price", get(find_by_price))
        .route("/by-category-and-price", get(find_by_category_and_price))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

fn parse_id(raw: &str) -> Result<ItemId, axum::response::Response> {
    raw.parse::<ItemId>()
        .map_err(|e| errors::search_error_to_response(SearchError::Domain(e)))
}

pub async fn save_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Item>, JsonRejection>,
) -> axum::response::Response {
    let Json(item) = match body {
        Ok(b) => b,
        Err(e) => return json_rejection(e),
    };
    if let Err(e) = services.items.save(&item).await {
        return errors::search_error_to_response(e);
    }
    (StatusCode::CREATED, Json(item)).into_response()
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ItemFields>, JsonRejection>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(fields) = match body {
        Ok(b) => b,
        Err(e) => return json_rejection(e),
    };
    let item = fields.into_item(id);
    if let Err(e) = services.items.save(&item).await {
        return errors::search_error_to_response(e);
    }
    Json(item).into_response()
}

pub async fn save_items(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Vec<Item>>, JsonRejection>,
) -> axum::response::Response {
    let Json(items) = match body {
        Ok(b) => b,
        Err(e) => return json_rejection(e),
    };
    match services.items.save_all(&items).await {
        Ok(indexed) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "indexed": indexed })),
        )
            .into_response(),
        Err(e) => errors::search_error_to_response(e),
    }
}

/// Index the built-in sample catalog.
pub async fn seed_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let catalog = sample_catalog();
    match services.items.save_all(&catalog).await {
        Ok(indexed) => {
            tracing::info!(indexed, "sample catalog indexed");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "indexed": indexed })),
            )
                .into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.items.find_by_id(id).await {
        Ok(Some(item)) => Json(item).into_response(),
        Ok(None) => errors::not_found(format!("item {id} not found")),
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match services.items.delete_by_id(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::not_found(format!("item {id} not found")),
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::SortParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let sort = match params.to_sort() {
        Ok(s) => s,
        Err(e) => return errors::search_error_to_response(e),
    };
    match services.items.find_all_sorted(sort).await {
        Ok(items) => {
            tracing::info!(hits = items.len(), "listed items");
            Json(items).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn find_by_price(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::PriceRangeParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    match services
        .items
        .find_by_price_between(params.min, params.max)
        .await
    {
        Ok(items) => {
            tracing::info!(hits = items.len(), min = params.min, max = params.max, "price range");
            Json(items).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn find_by_category_and_price(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::CategoryPriceParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    match services
        .items
        .find_by_category_and_price(&params.category, params.price)
        .await
    {
        Ok(items) => {
            tracing::info!(hits = items.len(), category = %params.category, "category and price");
            Json(items).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}
