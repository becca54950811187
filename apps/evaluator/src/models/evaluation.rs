use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Insight stored when the portfolio could not be analyzed.
pub const PORTFOLIO_PLACEHOLDER_INSIGHT: &str = "Portfolio analysis unavailable";

/// One applicant/job pairing to evaluate. Built once, then moved into the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub applicant_id: Uuid,
    pub job_id: Uuid,
    pub resume_path: String,
    pub github_username: String,
    pub job_skills: Vec<String>,
    pub job_role: String,
}

/// Structured resume content as returned by the extraction model.
/// Every field is optional on the wire so partial answers still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeData {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub years_of_experience: f64,
    #[serde(default)]
    pub primary_role: Option<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillMatchResult {
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// 0 – 100
    pub skill_match_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioData {
    /// 0 – 100
    pub portfolio_score: u32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub insight: String,
}

impl Default for PortfolioData {
    fn default() -> Self {
        Self {
            portfolio_score: 0,
            strengths: vec![],
            weaknesses: vec![],
            insight: PORTFOLIO_PLACEHOLDER_INSIGHT.to_string(),
        }
    }
}

/// Hiring recommendation derived from the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    StrongMatch,
    ModerateMatch,
    #[default]
    WeakMatch,
}

impl Decision {
    /// `>= 75` strong, `>= 50` moderate, anything lower is weak.
    pub fn from_score(final_score: u32) -> Self {
        if final_score >= 75 {
            Decision::StrongMatch
        } else if final_score >= 50 {
            Decision::ModerateMatch
        } else {
            Decision::WeakMatch
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::StrongMatch => "StrongMatch",
            Decision::ModerateMatch => "ModerateMatch",
            Decision::WeakMatch => "WeakMatch",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Resume,
    SkillMatch,
    Portfolio,
    Decision,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::Resume => "resume",
            StageName::SkillMatch => "skill_match",
            StageName::Portfolio => "portfolio",
            StageName::Decision => "decision",
        };
        f.write_str(name)
    }
}

/// Soft-failure marker left by a stage that fell back to its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: StageName,
    pub cause: String,
}

/// Record threaded through the stages of a single run.
///
/// Every field starts at a value later stages can consume, so a failed stage
/// leaves the state usable and the run always reaches the decision stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationState {
    pub resume_data: ResumeData,
    pub skill_match_result: SkillMatchResult,
    pub portfolio_data: PortfolioData,
    pub final_score: u32,
    pub decision: Decision,
    pub degraded_stages: Vec<StageFailure>,
    /// False when the evaluation record could not be written.
    pub persisted: bool,
}

impl EvaluationState {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_stages.is_empty()
    }

    pub(crate) fn record_failure(&mut self, stage: StageName, cause: impl ToString) {
        self.degraded_stages.push(StageFailure {
            stage,
            cause: cause.to_string(),
        });
    }
}

/// Persisted outcome of one evaluation. Unique per (applicant_id, job_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub applicant_id: Uuid,
    pub job_id: Uuid,
    pub final_score: u32,
    pub decision: Decision,
    pub ai_summary: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_thresholds() {
        assert_eq!(Decision::from_score(100), Decision::StrongMatch);
        assert_eq!(Decision::from_score(75), Decision::StrongMatch);
        assert_eq!(Decision::from_score(74), Decision::ModerateMatch);
        assert_eq!(Decision::from_score(50), Decision::ModerateMatch);
        assert_eq!(Decision::from_score(49), Decision::WeakMatch);
        assert_eq!(Decision::from_score(0), Decision::WeakMatch);
    }

    #[test]
    fn test_decision_serializes_as_variant_name() {
        let json = serde_json::to_string(&Decision::ModerateMatch).unwrap();
        assert_eq!(json, r#""ModerateMatch""#);
        assert_eq!(Decision::StrongMatch.to_string(), "StrongMatch");
    }

    #[test]
    fn test_default_state_is_consumable() {
        let state = EvaluationState::default();
        assert!(state.resume_data.skills.is_empty());
        assert_eq!(state.skill_match_result.skill_match_score, 0);
        assert_eq!(state.portfolio_data.portfolio_score, 0);
        assert_eq!(state.portfolio_data.insight, PORTFOLIO_PLACEHOLDER_INSIGHT);
        assert_eq!(state.decision, Decision::WeakMatch);
        assert!(!state.is_degraded());
    }

    #[test]
    fn test_resume_data_decodes_partial_payload() {
        let data: ResumeData = serde_json::from_str(r#"{"skills": ["Rust", "SQL"]}"#).unwrap();
        assert_eq!(data.skills, vec!["Rust", "SQL"]);
        assert_eq!(data.years_of_experience, 0.0);
        assert!(data.primary_role.is_none());
    }
}
