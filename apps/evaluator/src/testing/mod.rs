//! In-memory fakes of every port and of the queue, plus fixtures shared by the unit tests.

mod fakes;
mod memory_queue;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::models::evaluation::EvaluationRequest;
use crate::models::hiring::{ApplicantRow, JobRow, NewApplicant, NewJob};
use crate::ports::{EvaluationSink, HiringRepository, PortfolioAnalyzer, ResumeExtractor};
use crate::workflow::WorkflowExecutor;

pub use fakes::{MemoryStore, PanickingResumes, StubPortfolio, StubResumes};
pub use memory_queue::InMemoryJobQueue;

pub fn request(job_skills: &[&str]) -> EvaluationRequest {
    EvaluationRequest {
        applicant_id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        resume_path: "uploads/resumes/test.pdf".to_string(),
        github_username: "octocat".to_string(),
        job_skills: job_skills.iter().map(|s| s.to_string()).collect(),
        job_role: "Backend Engineer".to_string(),
    }
}

pub fn executor(
    resumes: Arc<dyn ResumeExtractor>,
    portfolios: Arc<dyn PortfolioAnalyzer>,
    sink: Arc<dyn EvaluationSink>,
) -> WorkflowExecutor {
    WorkflowExecutor::new(resumes, portfolios, sink, Duration::from_secs(5))
}

/// Inserts a job with `skills` and one applicant for it.
pub async fn seed_applicant(store: &MemoryStore, skills: &[&str]) -> (ApplicantRow, JobRow) {
    let job = store
        .insert_job(NewJob {
            title: "Backend Engineer".to_string(),
            description: "Build and run services".to_string(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_level: "mid".to_string(),
        })
        .await
        .expect("memory store accepts jobs");

    let applicant = store
        .insert_applicant(NewApplicant {
            job_id: job.id,
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            github_url: "https://github.com/octocat".to_string(),
            github_username: "octocat".to_string(),
            resume_path: "uploads/resumes/jane.pdf".to_string(),
        })
        .await
        .expect("memory store accepts applicants");

    (applicant, job)
}
