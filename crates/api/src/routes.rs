//! HTTP routes for transfer lookups and metrics.

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use token_ledger_db::{LedgerStore, TransferRecord};
use token_ledger_telemetry::Metrics;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::address::validate_address;
use crate::error::ApiError;
use crate::pagination::{PageParams, PageRequest, Pagination};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub metrics: Metrics,
}

/// Body of `GET /api/transfers/:address`.
#[derive(Debug, Serialize)]
pub struct TransfersResponse {
    pub transfers: Vec<TransferRecord>,
    pub pagination: Pagination,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/transfers/:address", get(list_transfers))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Server running on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn list_transfers(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<TransfersResponse>, ApiError> {
    let request = PageRequest::from_params(&params);
    let address = validate_address(&address)?;

    let page = state.store.query(&address, request.page, request.limit).await?;
    debug!(
        "Returning {} transfers for {} (page {}, limit {})",
        page.records.len(),
        address,
        request.page,
        request.limit
    );

    Ok(Json(TransfersResponse {
        transfers: page.records,
        pagination: Pagination::new(request, page.total_count),
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    match state.metrics.gather() {
        Ok(body) => Ok((StatusCode::OK, body)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
