//! Query layer errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use token_ledger_db::StoreError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client error, rejected before the store is queried.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidAddress(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid Ethereum address" })),
            )
                .into_response(),
            ApiError::StoreUnavailable(e) => {
                error!("Error fetching transfers: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
