//! Axum Router Configuration
//!
//! This module defines the HTTP routing for the service: the liveness
//! endpoint and the WebSocket ingress.

use crate::{state::AppState, ws::ws_handler};

use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws/transcribe/stream", get(ws_handler))
        .with_state(app_state)
}

async fn healthz() -> &'static str {
    "ok"
}
