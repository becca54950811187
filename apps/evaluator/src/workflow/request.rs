use uuid::Uuid;

use crate::models::evaluation::EvaluationRequest;
use crate::models::hiring::{ApplicantRow, JobRow};
use crate::ports::{CapabilityError, HiringRepository};

impl EvaluationRequest {
    pub fn from_records(applicant: &ApplicantRow, job: &JobRow) -> Self {
        Self {
            applicant_id: applicant.id,
            job_id: job.id,
            resume_path: applicant.resume_path.clone(),
            github_username: applicant.github_username.clone(),
            job_skills: job.required_skills.clone(),
            job_role: job.title.clone(),
        }
    }
}

/// Loads the applicant and job behind a queue entry and builds the executor input.
/// Either record missing is `CapabilityError::NotFound`.
pub async fn load_request(
    repo: &dyn HiringRepository,
    applicant_id: Uuid,
    job_id: Uuid,
) -> Result<EvaluationRequest, CapabilityError> {
    let applicant = repo
        .fetch_applicant(applicant_id)
        .await?
        .ok_or_else(|| CapabilityError::NotFound(format!("Applicant {applicant_id} not found")))?;
    let job = repo
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| CapabilityError::NotFound(format!("Job {job_id} not found")))?;

    Ok(EvaluationRequest::from_records(&applicant, &job))
}
