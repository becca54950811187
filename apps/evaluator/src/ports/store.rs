use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::evaluation::EvaluationRecord;
use crate::models::hiring::{ApplicantRow, CandidateRow, JobRow, NewApplicant, NewJob};
use crate::ports::{CapabilityError, EvaluationSink, HiringRepository};

/// PostgreSQL-backed persistence for jobs, applicants and evaluations.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationSink for PgStore {
    /// Upserts by (applicant_id, job_id): the last writer wins, duplicates never accumulate.
    async fn persist_evaluation(&self, record: &EvaluationRecord) -> Result<(), CapabilityError> {
        sqlx::query(
            r#"
            INSERT INTO evaluations
                (id, applicant_id, job_id, final_score, decision, ai_summary, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (applicant_id, job_id) DO UPDATE SET
                final_score = EXCLUDED.final_score,
                decision = EXCLUDED.decision,
                ai_summary = EXCLUDED.ai_summary,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.applicant_id)
        .bind(record.job_id)
        .bind(record.final_score as i32)
        .bind(record.decision.as_str())
        .bind(&record.ai_summary)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            "Stored evaluation for applicant {} / job {}: {} ({})",
            record.applicant_id, record.job_id, record.final_score, record.decision
        );
        Ok(())
    }
}

#[async_trait]
impl HiringRepository for PgStore {
    async fn fetch_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, CapabilityError> {
        Ok(
            sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn fetch_job(&self, id: Uuid) -> Result<Option<JobRow>, CapabilityError> {
        Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_job(&self, job: NewJob) -> Result<JobRow, CapabilityError> {
        let skills: Vec<String> = job
            .required_skills
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, title, description, required_skills, experience_level, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.title.trim())
        .bind(job.description.trim())
        .bind(&skills)
        .bind(job.experience_level.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<JobRow>, CapabilityError> {
        Ok(sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_applicant(
        &self,
        applicant: NewApplicant,
    ) -> Result<ApplicantRow, CapabilityError> {
        Ok(sqlx::query_as::<_, ApplicantRow>(
            r#"
            INSERT INTO applicants
                (id, job_id, name, email, github_url, github_username, resume_path, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'submitted', $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(applicant.job_id)
        .bind(&applicant.name)
        .bind(&applicant.email)
        .bind(&applicant.github_url)
        .bind(&applicant.github_username)
        .bind(&applicant.resume_path)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_applicant(&self, id: Uuid) -> Result<(), CapabilityError> {
        sqlx::query("DELETE FROM applicants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn candidates_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateRow>, CapabilityError> {
        Ok(sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT a.id AS applicant_id, a.name, a.email, a.github_url,
                   e.final_score, e.decision, e.ai_summary
            FROM applicants a
            LEFT JOIN evaluations e ON e.applicant_id = a.id AND e.job_id = a.job_id
            WHERE a.job_id = $1
            ORDER BY e.final_score DESC NULLS LAST, a.created_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
