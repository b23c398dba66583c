use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use common::models::{InboundSignal, Signal, Trade};
use tracing::warn;

use super::error::ApiError;
use super::router::AppState;
use crate::services::orchestrator::WorkflowReport;

pub const RECENT_LIMIT: u32 = 50;

/// Raw body so malformed JSON maps to our own 400 instead of axum's rejection.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WorkflowReport>, ApiError> {
    let signal: InboundSignal = serde_json::from_slice(&body).map_err(|e| {
        warn!("Malformed signal payload: {}", e);
        ApiError::bad_request(format!("invalid signal payload: {e}"))
    })?;
    let report = state.orchestrator.handle(signal).await?;
    Ok(Json(report))
}

pub async fn recent_signals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Signal>>, ApiError> {
    let store = state.store.as_ref().ok_or_else(ApiError::persistence_disabled)?;
    Ok(Json(store.recent_signals(RECENT_LIMIT).await?))
}

pub async fn recent_trades(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Trade>>, ApiError> {
    let store = state.store.as_ref().ok_or_else(ApiError::persistence_disabled)?;
    Ok(Json(store.recent_trades(RECENT_LIMIT).await?))
}
