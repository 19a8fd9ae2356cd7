//! Liveness and diagnostic endpoints

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::relay::server::AppState;

/// Handle GET /
pub async fn handle_root() -> &'static str {
    "ok"
}

/// Handle GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "service": state.config.server.service_name,
        "port": state.config.server.port,
        "streaming": state.config.completion.enable_streaming,
    }))
}
