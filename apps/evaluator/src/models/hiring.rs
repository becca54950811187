use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub experience_level: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub github_url: String,
    pub github_username: String,
    pub resume_path: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Applicant joined with its evaluation, if one exists yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub applicant_id: Uuid,
    pub name: String,
    pub email: String,
    pub github_url: String,
    pub final_score: Option<i32>,
    pub decision: Option<String>,
    pub ai_summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub experience_level: String,
}

impl NewJob {
    /// Returns the first validation problem, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description cannot be empty".to_string());
        }
        if self.experience_level.trim().is_empty() {
            return Err("experience_level cannot be empty".to_string());
        }
        if self.required_skills.iter().all(|s| s.trim().is_empty()) {
            return Err("required_skills must contain at least one skill".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub github_url: String,
    pub github_username: String,
    pub resume_path: String,
}
