use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "codelang-detect",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime": state.started_at.elapsed().as_secs(),
        "languages": state.detector.catalog().len(),
        "signals": state.detector.signals().len(),
    }))
}

/// Graceful shutdown endpoint for the host app (works where SIGTERM does not).
pub async fn shutdown_handler(State(state): State<AppState>) -> Json<Value> {
    tracing::info!("Shutdown requested via HTTP endpoint");
    state.shutdown.notify_one();
    Json(json!({
        "status": "shutting_down",
    }))
}
