use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::evaluation::{EvaluationRecord, PortfolioData, ResumeData};
use crate::models::hiring::{ApplicantRow, CandidateRow, JobRow, NewApplicant, NewJob};
use crate::ports::{
    CapabilityError, EvaluationSink, HiringRepository, PortfolioAnalyzer, ResumeExtractor,
};

/// Resume extractor returning a canned answer, optionally after a delay.
pub struct StubResumes {
    answer: Result<ResumeData, CapabilityError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubResumes {
    pub fn ok(skills: &[&str]) -> Self {
        Self {
            answer: Ok(ResumeData {
                skills: skills.iter().map(|s| s.to_string()).collect(),
                years_of_experience: 3.0,
                primary_role: Some("Backend Engineer".to_string()),
                tech_stack: vec![],
            }),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: CapabilityError) -> Self {
        Self {
            answer: Err(err),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeExtractor for StubResumes {
    async fn extract_resume_skills(&self, _resume_path: &str) -> Result<ResumeData, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}

pub struct PanickingResumes;

#[async_trait]
impl ResumeExtractor for PanickingResumes {
    async fn extract_resume_skills(&self, _resume_path: &str) -> Result<ResumeData, CapabilityError> {
        panic!("resume reader exploded");
    }
}

/// Portfolio analyzer that records every (handle, role) it is asked about.
pub struct StubPortfolio {
    answer: Result<PortfolioData, CapabilityError>,
    received: Mutex<Vec<(String, String)>>,
}

impl StubPortfolio {
    pub fn ok(score: u32, insight: &str) -> Self {
        Self {
            answer: Ok(PortfolioData {
                portfolio_score: score,
                strengths: vec!["Consistent commits".to_string()],
                weaknesses: vec![],
                insight: insight.to_string(),
            }),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: CapabilityError) -> Self {
        Self {
            answer: Err(err),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<(String, String)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl PortfolioAnalyzer for StubPortfolio {
    async fn analyze_portfolio(
        &self,
        handle: &str,
        job_role: &str,
    ) -> Result<PortfolioData, CapabilityError> {
        self.received
            .lock()
            .unwrap()
            .push((handle.to_string(), job_role.to_string()));
        self.answer.clone()
    }
}

#[derive(Default)]
struct Tables {
    jobs: Vec<JobRow>,
    applicants: Vec<ApplicantRow>,
    evaluations: HashMap<(Uuid, Uuid), EvaluationRecord>,
    evaluation_writes: usize,
}

/// Hiring repository and evaluation sink backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: bool,
}

impl MemoryStore {
    /// A store whose evaluation writes always fail.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn evaluation(&self, applicant_id: Uuid, job_id: Uuid) -> Option<EvaluationRecord> {
        self.tables
            .lock()
            .unwrap()
            .evaluations
            .get(&(applicant_id, job_id))
            .cloned()
    }

    /// Successful evaluation writes, counting overwrites.
    pub fn evaluation_writes(&self) -> usize {
        self.tables.lock().unwrap().evaluation_writes
    }
}

#[async_trait]
impl EvaluationSink for MemoryStore {
    async fn persist_evaluation(&self, record: &EvaluationRecord) -> Result<(), CapabilityError> {
        if self.fail_writes {
            return Err(CapabilityError::Store("connection refused".to_string()));
        }
        let mut tables = self.tables.lock().unwrap();
        tables
            .evaluations
            .insert((record.applicant_id, record.job_id), record.clone());
        tables.evaluation_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl HiringRepository for MemoryStore {
    async fn fetch_applicant(&self, id: Uuid) -> Result<Option<ApplicantRow>, CapabilityError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.applicants.iter().find(|a| a.id == id).cloned())
    }

    async fn fetch_job(&self, id: Uuid) -> Result<Option<JobRow>, CapabilityError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn insert_job(&self, job: NewJob) -> Result<JobRow, CapabilityError> {
        let row = JobRow {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            required_skills: job.required_skills,
            experience_level: job.experience_level,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().jobs.push(row.clone());
        Ok(row)
    }

    async fn list_jobs(&self, limit: i64, offset: i64) -> Result<Vec<JobRow>, CapabilityError> {
        let tables = self.tables.lock().unwrap();
        let mut jobs = tables.jobs.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn insert_applicant(
        &self,
        applicant: NewApplicant,
    ) -> Result<ApplicantRow, CapabilityError> {
        let row = ApplicantRow {
            id: Uuid::new_v4(),
            job_id: applicant.job_id,
            name: applicant.name,
            email: applicant.email,
            github_url: applicant.github_url,
            github_username: applicant.github_username,
            resume_path: applicant.resume_path,
            status: "submitted".to_string(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().applicants.push(row.clone());
        Ok(row)
    }

    async fn delete_applicant(&self, id: Uuid) -> Result<(), CapabilityError> {
        self.tables.lock().unwrap().applicants.retain(|a| a.id != id);
        Ok(())
    }

    async fn candidates_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateRow>, CapabilityError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<CandidateRow> = tables
            .applicants
            .iter()
            .filter(|a| a.job_id == job_id)
            .map(|a| {
                let evaluation = tables.evaluations.get(&(a.id, job_id));
                CandidateRow {
                    applicant_id: a.id,
                    name: a.name.clone(),
                    email: a.email.clone(),
                    github_url: a.github_url.clone(),
                    final_score: evaluation.map(|e| e.final_score as i32),
                    decision: evaluation.map(|e| e.decision.to_string()),
                    ai_summary: evaluation.map(|e| e.ai_summary.clone()),
                }
            })
            .collect();
        // highest score first, unevaluated applicants last
        rows.sort_by(|a, b| match (a.final_score, b.final_score) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(rows)
    }
}
