//! Route handlers.

pub mod boards;
pub mod chats;
pub mod notifications;

use axum::http::StatusCode;
use stride_store::StrideError;

/// Map a domain error onto an HTTP status.
pub(crate) fn reject(e: StrideError) -> (StatusCode, String) {
    let status = match &e {
        StrideError::Validation(_) => StatusCode::BAD_REQUEST,
        StrideError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub async fn health() -> &'static str {
    "ok"
}
