//! The four evaluation stages. Each is total: failures become the field's default
//! value plus a soft-failure marker on the state, never an error for the caller.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::models::evaluation::{
    EvaluationRecord, EvaluationRequest, EvaluationState, PortfolioData, ResumeData, StageName,
};
use crate::ports::{CapabilityError, EvaluationSink, PortfolioAnalyzer, ResumeExtractor};
use crate::workflow::scoring::decide;
use crate::workflow::skills::match_skills;

/// Tagged result of a stage's capability call.
#[derive(Debug, Clone)]
pub enum StageOutcome<T> {
    Ok(T),
    /// The call failed; `value` is the stage's default.
    Degraded { value: T, cause: CapabilityError },
}

impl<T: Default> StageOutcome<T> {
    pub fn from_result(result: Result<T, CapabilityError>) -> Self {
        match result {
            Ok(value) => StageOutcome::Ok(value),
            Err(cause) => StageOutcome::Degraded {
                value: T::default(),
                cause,
            },
        }
    }
}

impl<T> StageOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StageOutcome::Degraded { .. })
    }

    /// Returns the value, recording the cause on `state` when degraded.
    fn settle(self, state: &mut EvaluationState, stage: StageName) -> T {
        match self {
            StageOutcome::Ok(value) => value,
            StageOutcome::Degraded { value, cause } => {
                state.record_failure(stage, &cause);
                value
            }
        }
    }
}

/// Runs a capability call under the stage timeout; expiry counts as that call failing.
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(CapabilityError::TimedOut(limit)))
}

pub async fn resume_stage(
    mut state: EvaluationState,
    request: &EvaluationRequest,
    extractor: &dyn ResumeExtractor,
    limit: Duration,
) -> EvaluationState {
    let outcome: StageOutcome<ResumeData> = StageOutcome::from_result(
        bounded(limit, extractor.extract_resume_skills(&request.resume_path)).await,
    );

    match &outcome {
        StageOutcome::Ok(data) => info!(
            "Resume parsed for applicant {}: {} skills",
            request.applicant_id,
            data.skills.len()
        ),
        StageOutcome::Degraded { cause, .. } => warn!(
            "Resume stage degraded for applicant {}: {cause}",
            request.applicant_id
        ),
    }

    state.resume_data = outcome.settle(&mut state, StageName::Resume);
    state
}

pub fn skill_match_stage(mut state: EvaluationState, request: &EvaluationRequest) -> EvaluationState {
    state.skill_match_result = match_skills(&request.job_skills, &state.resume_data.skills);
    info!(
        "Skill match for applicant {}: {}/100 ({} matched, {} missing)",
        request.applicant_id,
        state.skill_match_result.skill_match_score,
        state.skill_match_result.matched_skills.len(),
        state.skill_match_result.missing_skills.len()
    );
    state
}

pub async fn portfolio_stage(
    mut state: EvaluationState,
    request: &EvaluationRequest,
    analyzer: &dyn PortfolioAnalyzer,
    limit: Duration,
) -> EvaluationState {
    let outcome: StageOutcome<PortfolioData> = StageOutcome::from_result(
        bounded(
            limit,
            analyzer.analyze_portfolio(&request.github_username, &request.job_role),
        )
        .await,
    );

    match &outcome {
        StageOutcome::Ok(data) => info!(
            "Portfolio scored for applicant {}: {}/100",
            request.applicant_id, data.portfolio_score
        ),
        StageOutcome::Degraded { cause, .. } => warn!(
            "Portfolio stage degraded for applicant {}: {cause}",
            request.applicant_id
        ),
    }

    state.portfolio_data = outcome.settle(&mut state, StageName::Portfolio);
    state
}

/// Computes the final score and decision, then persists the record.
/// A persistence failure is recorded on the state but never hides the decision.
pub async fn decision_stage(
    mut state: EvaluationState,
    request: &EvaluationRequest,
    sink: &dyn EvaluationSink,
    limit: Duration,
) -> EvaluationState {
    let (final_score, decision) = decide(
        state.skill_match_result.skill_match_score,
        state.portfolio_data.portfolio_score,
    );
    state.final_score = final_score;
    state.decision = decision;

    let record = EvaluationRecord {
        applicant_id: request.applicant_id,
        job_id: request.job_id,
        final_score,
        decision,
        ai_summary: state.portfolio_data.insight.clone(),
        created_at: Utc::now(),
    };

    match bounded(limit, sink.persist_evaluation(&record)).await {
        Ok(()) => state.persisted = true,
        Err(e) => {
            error!(
                "Failed to persist evaluation for applicant {} / job {}: {e}",
                request.applicant_id, request.job_id
            );
            state.persisted = false;
            state.record_failure(StageName::Decision, &e);
        }
    }

    info!(
        "Decision for applicant {}: {} ({}/100)",
        request.applicant_id, decision, final_score
    );
    state
}
