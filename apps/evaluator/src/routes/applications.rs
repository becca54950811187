use std::path::Path as FsPath;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::dispatch::DispatchMode;
use crate::errors::AppError;
use crate::models::hiring::NewApplicant;
use crate::models::queue::QueueEntry;
use crate::ports::portfolio::portfolio_handle_from_url;
use crate::ports::resume::SUPPORTED_EXTENSIONS;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApplicationAccepted {
    pub message: String,
    pub applicant_id: Uuid,
    pub queue_entry: QueueEntry,
    pub dispatch_mode: DispatchMode,
    pub started_immediately: bool,
}

#[derive(Default)]
struct ApplicationForm {
    name: Option<String>,
    email: Option<String>,
    github_url: Option<String>,
    resume: Option<(String, Bytes)>,
}

/// POST /api/v1/jobs/:job_id/applications
/// Multipart fields: `name`, `email`, `github_url`, `resume` (file).
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicationAccepted>), AppError> {
    state
        .repo
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let mut form = ApplicationForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" | "email" | "github_url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable field '{field_name}': {e}")))?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match field_name.as_str() {
                    "name" => form.name = value,
                    "email" => form.email = value,
                    _ => form.github_url = value,
                }
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable resume upload: {e}")))?;
                form.resume = Some((file_name, data));
            }
            _ => {}
        }
    }

    let name = required(form.name, "name")?;
    let email = required(form.email, "email")?;
    let github_url = required(form.github_url, "github_url")?;
    let (file_name, data) = form
        .resume
        .ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;

    let extension = resume_extension(&file_name)?;
    if data.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }

    let resume_path = state.upload_dir.join(format!("{}.{extension}", Uuid::new_v4()));
    store_resume(&state.upload_dir, &resume_path, &data)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store resume at {}: {e}", resume_path.display()))?;

    let applicant = state
        .repo
        .insert_applicant(NewApplicant {
            job_id,
            name,
            email,
            github_username: portfolio_handle_from_url(&github_url),
            github_url,
            resume_path: resume_path.to_string_lossy().into_owned(),
        })
        .await?;

    let receipt = match state.gate.submit(applicant.id, job_id).await {
        Ok(receipt) => receipt,
        Err(e) => {
            discard_application(&state, applicant.id, &resume_path).await;
            return Err(e.into());
        }
    };
    info!(
        "Application {} for job {job_id} accepted (entry {}, {})",
        applicant.id, receipt.entry.id, receipt.mode
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ApplicationAccepted {
            message: "Application submitted. Evaluation in progress.".to_string(),
            applicant_id: applicant.id,
            queue_entry: receipt.entry,
            dispatch_mode: receipt.mode,
            started_immediately: receipt.started_immediately,
        }),
    ))
}

async fn store_resume(dir: &FsPath, path: &FsPath, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, data).await
}

/// Undoes intake when no queue entry could be created, so no applicant is left
/// without an evaluation on its way.
async fn discard_application(state: &AppState, applicant_id: Uuid, resume_path: &FsPath) {
    if let Err(e) = state.repo.delete_applicant(applicant_id).await {
        error!("Failed to roll back applicant {applicant_id}: {e}");
    }
    if let Err(e) = tokio::fs::remove_file(resume_path).await {
        warn!("Failed to remove resume {}: {e}", resume_path.display());
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Lower-cased extension of an uploaded resume, if it is one the extractor can read.
fn resume_extension(file_name: &str) -> Result<String, AppError> {
    let extension = FsPath::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(AppError::Validation(format!(
            "unsupported resume type '{file_name}' (allowed: {})",
            SUPPORTED_EXTENSIONS.join(", ")
        )))
    }
}
