use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use itemsearch_core::DomainError;
use itemsearch_search::{PageRequest, SearchError};

pub fn search_error_to_response(err: SearchError) -> axum::response::Response {
    match err {
        SearchError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        SearchError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        SearchError::InvalidRequest(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_request", msg)
        }
        SearchError::Engine {
            status,
            kind,
            reason,
        } => {
            let message = match kind {
                Some(kind) => format!("{kind}: {reason}"),
                None => reason,
            };
            tracing::warn!(engine_status = status, %message, "engine rejected request");
            match status {
                401 | 403 => json_error(StatusCode::BAD_GATEWAY, "engine_unauthorized", message),
                404 => json_error(StatusCode::NOT_FOUND, "engine_not_found", message),
                409 => json_error(StatusCode::CONFLICT, "engine_conflict", message),
                400..=499 => json_error(StatusCode::BAD_REQUEST, "engine_rejected", message),
                _ => json_error(StatusCode::BAD_GATEWAY, "engine_error", message),
            }
        }
        SearchError::Bulk { failed } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "bulk_rejected",
            format!("rejected documents: {}", failed.join(", ")),
        ),
        SearchError::Transport(e) => {
            tracing::warn!(error = %e, "engine unreachable");
            json_error(StatusCode::BAD_GATEWAY, "engine_unreachable", e.to_string())
        }
        err @ (SearchError::InvalidResponse(_) | SearchError::Json(_)) => {
            tracing::warn!(error = %err, "unexpected engine response");
            json_error(
                StatusCode::BAD_GATEWAY,
                "engine_response_invalid",
                err.to_string(),
            )
        }
    }
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

pub fn not_found(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", message)
}

pub fn page_request(
    page: Option<u32>,
    size: Option<u32>,
) -> Result<PageRequest, axum::response::Response> {
    PageRequest::of(
        page.unwrap_or(0),
        size.unwrap_or(PageRequest::DEFAULT_SIZE),
    )
    .map_err(search_error_to_response)
}
