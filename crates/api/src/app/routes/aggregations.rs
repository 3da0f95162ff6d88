use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::QueryRejection},
    response::IntoResponse,
    routing::get,
};

use itemsearch_core::fields;
use itemsearch_search::{Aggregation, SearchError, SearchRequest, TermsAggregation};

use crate::app::routes::query_rejection;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

const BRANDS: &str = "brands";
const AVG_PRICE: &str = "avg_price";

pub fn router() -> Router {
    Router::new()
        .route("/brands", get(brands))
        .route("/brands/avg-price", get(brands_avg_price))
}

fn brand_terms(size: Option<u32>) -> Aggregation {
    let agg = Aggregation::terms(BRANDS, fields::BRAND);
    match size {
        Some(n) => agg.size(n),
        None => agg,
    }
}

/// Runs a hits-free request carrying `agg` and returns its terms result.
async fn run_terms(
    services: &AppServices,
    agg: Aggregation,
) -> Result<TermsAggregation, SearchError> {
    let request = SearchRequest::new().add_aggregation(agg).without_hits();
    let (_, aggregations) = services.items.search(&request).await?.into_parts();
    aggregations
        .terms(BRANDS)
        .cloned()
        .ok_or_else(|| SearchError::invalid_response("brands aggregation missing"))
}

/// Document count per brand.
pub async fn brands(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::BucketParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let size = match params.bucket_size() {
        Ok(size) => size,
        Err(e) => return errors::search_error_to_response(e),
    };
    match run_terms(&services, brand_terms(size)).await {
        Ok(terms) => {
            let buckets: Vec<dto::BrandBucket> =
                terms.buckets().iter().map(dto::BrandBucket::from).collect();
            tracing::info!(buckets = buckets.len(), "brand buckets");
            Json(buckets).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}

/// Document count and average price per brand.
pub async fn brands_avg_price(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::BucketParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(p) => p,
        Err(e) => return query_rejection(e),
    };
    let size = match params.bucket_size() {
        Ok(size) => size,
        Err(e) => return errors::search_error_to_response(e),
    };
    let agg = brand_terms(size).sub_aggregation(Aggregation::avg(AVG_PRICE, fields::PRICE));
    match run_terms(&services, agg).await {
        Ok(terms) => {
            let buckets: Vec<dto::BrandAvgBucket> = terms
                .buckets()
                .iter()
                .map(|b| dto::BrandAvgBucket {
                    key: b.key_as_string().to_string(),
                    doc_count: b.doc_count(),
                    avg_price: b.metric(AVG_PRICE),
                })
                .collect();
            tracing::info!(buckets = buckets.len(), "brand average prices");
            Json(buckets).into_response()
        }
        Err(e) => errors::search_error_to_response(e),
    }
}
