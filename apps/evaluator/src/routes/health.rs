use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /health
/// Liveness only; touches no dependency.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "evaluator"
    }))
}

/// GET /health/ready
/// Reports queue depth; 503 when the queue store cannot be reached.
pub async fn readiness_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let depth = state
        .queue
        .depth()
        .await
        .map_err(|e| AppError::ServiceUnavailable(format!("queue store unreachable: {e}")))?;

    Ok(Json(json!({
        "status": "ready",
        "dispatch_mode": state.gate.mode(),
        "queue": depth
    })))
}
