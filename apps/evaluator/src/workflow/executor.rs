use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::models::evaluation::{EvaluationRequest, EvaluationState};
use crate::ports::{EvaluationSink, PortfolioAnalyzer, ResumeExtractor};
use crate::workflow::stages::{decision_stage, portfolio_stage, resume_stage, skill_match_stage};

/// Runs one request through Resume → SkillMatch → Portfolio → Decision.
///
/// No branching and no retries: every stage runs exactly once and sees only the
/// state produced by the stage before it. Retrying is the queue's job.
pub struct WorkflowExecutor {
    resumes: Arc<dyn ResumeExtractor>,
    portfolios: Arc<dyn PortfolioAnalyzer>,
    sink: Arc<dyn EvaluationSink>,
    stage_timeout: Duration,
}

impl WorkflowExecutor {
    pub fn new(
        resumes: Arc<dyn ResumeExtractor>,
        portfolios: Arc<dyn PortfolioAnalyzer>,
        sink: Arc<dyn EvaluationSink>,
        stage_timeout: Duration,
    ) -> Self {
        Self {
            resumes,
            portfolios,
            sink,
            stage_timeout,
        }
    }

    /// Always returns a state with `decision` set, however many capabilities failed.
    pub async fn run(&self, request: EvaluationRequest) -> EvaluationState {
        info!(
            "Evaluating applicant {} for job {}",
            request.applicant_id, request.job_id
        );

        let state = EvaluationState::default();
        let state = resume_stage(state, &request, self.resumes.as_ref(), self.stage_timeout).await;
        let state = skill_match_stage(state, &request);
        let state =
            portfolio_stage(state, &request, self.portfolios.as_ref(), self.stage_timeout).await;
        let state = decision_stage(state, &request, self.sink.as_ref(), self.stage_timeout).await;

        if state.is_degraded() {
            info!(
                "Evaluation of applicant {} finished degraded: {:?}",
                request.applicant_id,
                state
                    .degraded_stages
                    .iter()
                    .map(|f| f.stage.to_string())
                    .collect::<Vec<_>>()
            );
        }
        state
    }
}
