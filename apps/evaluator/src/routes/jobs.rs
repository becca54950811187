use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::hiring::{CandidateRow, JobRow, NewJob};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct CandidatesResponse {
    pub job_id: Uuid,
    pub job_title: String,
    pub candidates: Vec<CandidateRow>,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(req): Json<NewJob>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    req.validate().map_err(AppError::Validation)?;
    let job = state.repo.insert_job(req).await?;
    tracing::info!("Created job {} ({})", job.id, job.title);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let offset = page.offset.unwrap_or(0);
    if offset < 0 {
        return Err(AppError::Validation("offset cannot be negative".to_string()));
    }

    Ok(Json(state.repo.list_jobs(limit, offset).await?))
}

/// GET /api/v1/jobs/:job_id/candidates
/// Applicants ranked by final score; unevaluated applicants come last.
pub async fn handle_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let job = state
        .repo
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let candidates = state.repo.candidates_for_job(job_id).await?;
    Ok(Json(CandidatesResponse {
        job_id,
        job_title: job.title,
        candidates,
    }))
}
