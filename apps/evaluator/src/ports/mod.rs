//! Capability ports: the narrow interfaces the workflow reaches external systems through.
//!
//! Stages only see these traits. Concrete backends live in the submodules and are
//! wired in `main`; tests swap in the fakes from `crate::testing`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::evaluation::{EvaluationRecord, PortfolioData, ResumeData};
use crate::models::hiring::{ApplicantRow, CandidateRow, JobRow, NewApplicant, NewJob};

pub mod portfolio;
pub mod prompts;
pub mod resume;
pub mod store;

#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    /// The resume file could not be read or contained no text.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// An upstream service was unreachable or answered with an error.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The model call failed or its output did not match the expected schema.
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<sqlx::Error> for CapabilityError {
    fn from(e: sqlx::Error) -> Self {
        CapabilityError::Store(e.to_string())
    }
}

#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    async fn extract_resume_skills(&self, resume_path: &str) -> Result<ResumeData, CapabilityError>;
}

#[async_trait]
pub trait PortfolioAnalyzer: Send + Sync {
    async fn analyze_portfolio(
        &self,
        handle: &str,
        job_role: &str,
    ) -> Result<PortfolioData, CapabilityError>;
}

/// Durable write of the final evaluation. Implementations must converge when
/// the same (applicant_id, job_id) is written more than once.
#[async_trait]
pub trait EvaluationSink: Send + Sync {
    async fn persist_evaluation(&self, record: &EvaluationRecord) -> Result<(), CapabilityError>;
}

/// Applicant and job records read by the dispatch paths and written by intake.
#[async_trait]
pub trait HiringRepository: Send + Sync {
    async fn fetch_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, CapabilityError>;
    async fn fetch_job(&self, id: Uuid) -> Result<Option<JobRow>, CapabilityError>;
    async fn insert_job(&self, job: NewJob) -> Result<JobRow, CapabilityError>;
    async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<JobRow>, CapabilityError>;
    async fn insert_applicant(&self, applicant: NewApplicant)
        -> Result<ApplicantRow, CapabilityError>;
    /// Removes an applicant whose intake could not be completed.
    async fn delete_applicant(&self, id: Uuid) -> Result<(), CapabilityError>;
    async fn candidates_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateRow>, CapabilityError>;
}
