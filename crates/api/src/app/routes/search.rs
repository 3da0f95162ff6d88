use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection, rejection::QueryRejection},
    response::IntoResponse,
    routing::{get, post},
};

use itemsearch_core::fields;
use itemsearch_search::{SearchRequest, query};

use crate::app::routes::{json_rejection, query_rejection};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/match", get(match_search))
        .route("/term", get(term_search))
        .route("/fuzzy", get(fuzzy_search))
        .route("/bool", post(bool_search))
        .route("/page", get(category_page))
        .route("/sorted", get(category_sorted))
}

/// Runs `request` and answers with the page echo.
async fn run_paged(
    services: &AppServices,
    kind: &'static str,
    request: SearchRequest,
) -> axum::response::Response {
    match services.items.search(&request).await {
        Ok(result) => {
            let page = result.into_page();
            tracing::info!(
                kind,
                total = page.total_elements(),
                returned = page.number_of_elements(),
                "search"
            );
            Json(page).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

pub async fn match_search(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::MatchParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let pageable = match errors::page_request(params.page, params.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => return errors::search_error_to_response(e),
    };
    let request = SearchRequest::new()
        .with_query(query)
        .with_pageable(pageable);
    run_paged(&services, "match", request).await
}

pub async fn term_search(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::TermParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let pageable = match errors::page_request(params.page, params.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let request = SearchRequest::new()
        .with_query(query::term_query(
            params.field,
            dto::scalar_value(&params.value),
        ))
        .with_pageable(pageable);
    run_paged(&services, "term", request).await
}

pub async fn fuzzy_search(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::FuzzyParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let pageable = match errors::page_request(params.page, params.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let query = match params.to_query() {
        Ok(q) => q,
        Err(e) => return errors::search_error_to_response(e),
    };
    let request = SearchRequest::new()
        .with_query(query)
        .with_pageable(pageable);
    run_paged(&services, "fuzzy", request).await
}

pub async fn bool_search(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::BoolSearchRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return json_rejection(e),
    };
    let pageable = match errors::page_request(body.page, body.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let query = match body.to_query() {
        Ok(q) => q,
        Err(e) => return errors::search_error_to_response(e),
    };
    let request = SearchRequest::new()
        .with_query(query)
        .with_pageable(pageable);
    run_paged(&services, "bool", request).await
}

/// One page of a category.
pub async fn category_page(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::CategoryPageParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let pageable = match errors::page_request(params.page, params.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let request = SearchRequest::new()
        .with_query(query::term_query(fields::CATEGORY, params.category))
        .with_pageable(pageable);
    run_paged(&services, "page", request).await
}

/// A category ordered by a field (price ascending unless told otherwise).
pub async fn category_sorted(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::SortedSearchParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let pageable = match errors::page_request(params.page, params.size) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let sort = match params.to_sort() {
        Ok(s) => s,
        Err(e) => return errors::search_error_to_response(e),
    };
    let request = SearchRequest::new()
        .with_query(query::term_query(fields::CATEGORY, params.category))
        .with_sort(sort)
        .with_pageable(pageable);
    run_paged(&services, "sorted", request).await
}
