pub mod applications;
pub mod evaluations;
pub mod health;
pub mod jobs;
pub mod queue;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Largest accepted request body; sized for resume uploads.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::readiness_handler))
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            post(applications::handle_apply),
        )
        .route(
            "/api/v1/jobs/:job_id/candidates",
            get(jobs::handle_candidates),
        )
        .route("/api/v1/queue/:id", get(queue::handle_get_entry))
        .route("/api/v1/evaluations", post(evaluations::handle_evaluate))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
