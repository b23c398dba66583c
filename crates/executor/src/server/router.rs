use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use storage::Persistence;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::services::orchestrator::OrderOrchestrator;

pub struct AppState {
    pub orchestrator: Arc<OrderOrchestrator>,
    /// Read endpoints answer 503 when `None`.
    pub store: Option<Arc<dyn Persistence>>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhooks", post(handlers::webhook))
        .route("/api/signals", get(handlers::recent_signals))
        .route("/api/trades", get(handlers::recent_trades))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
