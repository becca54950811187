use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::queue::QueueEntry;
use crate::state::AppState;

/// GET /api/v1/queue/:id
pub async fn handle_get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueEntry>, AppError> {
    let entry = state
        .queue
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Queue entry {id} not found")))?;
    Ok(Json(entry))
}
