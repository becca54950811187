use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::EvaluationState;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub applicant_id: Uuid,
    pub job_id: Uuid,
}

/// POST /api/v1/evaluations
/// Runs the workflow in the request and returns the resulting state, degraded stages included.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationState>, AppError> {
    let result = state.gate.evaluate_now(req.applicant_id, req.job_id).await?;
    Ok(Json(result))
}
