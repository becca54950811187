//! Portfolio analysis backend. Summarises public GitHub repositories and asks the model
//! for a score and hiring insight.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, Structured};
use crate::models::evaluation::PortfolioData;
use crate::ports::prompts::{PORTFOLIO_PROMPT_TEMPLATE, PORTFOLIO_SYSTEM};
use crate::ports::{CapabilityError, PortfolioAnalyzer};

const GITHUB_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("evaluator/", env!("CARGO_PKG_VERSION"));
/// Repositories included in the prompt, most recently pushed first.
const MAX_REPOS: usize = 50;

/// Repository fields as returned by `GET /users/{user}/repos`.
#[derive(Debug, Clone, Deserialize)]
struct GithubRepo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u32,
}

#[derive(Debug, Clone, Serialize)]
struct RepoSummary {
    name: String,
    description: String,
    language: String,
    stars: u32,
}

impl From<GithubRepo> for RepoSummary {
    fn from(repo: GithubRepo) -> Self {
        Self {
            name: repo.name,
            description: repo.description.unwrap_or_default(),
            language: repo.language.unwrap_or_default(),
            stars: repo.stargazers_count,
        }
    }
}

/// Model answer before clamping into `PortfolioData`.
#[derive(Debug, Clone, Deserialize)]
struct PortfolioAssessment {
    portfolio_score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    insight: String,
}

impl From<PortfolioAssessment> for PortfolioData {
    fn from(a: PortfolioAssessment) -> Self {
        let score = if a.portfolio_score.is_finite() {
            a.portfolio_score.round().clamp(0.0, 100.0) as u32
        } else {
            0
        };
        Self {
            portfolio_score: score,
            strengths: a.strengths,
            weaknesses: a.weaknesses,
            insight: a.insight,
        }
    }
}

pub struct GithubPortfolioAnalyzer {
    http: Client,
    llm: LlmClient,
    api_base: String,
    token: Option<String>,
}

impl GithubPortfolioAnalyzer {
    pub fn new(
        llm: LlmClient,
        api_base: String,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder()
                .timeout(GITHUB_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()?,
            llm,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn fetch_repos(&self, handle: &str) -> Result<Vec<RepoSummary>, CapabilityError> {
        let url = format!(
            "{}/users/{handle}/repos?sort=pushed&per_page={MAX_REPOS}",
            self.api_base
        );

        let mut request = self
            .http
            .get(&url)
            .header("accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CapabilityError::Fetch(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CapabilityError::Fetch(format!(
                "GitHub returned {status} for user '{handle}'"
            )));
        }

        let repos: Vec<GithubRepo> = response
            .json()
            .await
            .map_err(|e| CapabilityError::Fetch(format!("unreadable GitHub response: {e}")))?;

        Ok(repos.into_iter().take(MAX_REPOS).map(RepoSummary::from).collect())
    }
}

#[async_trait]
impl PortfolioAnalyzer for GithubPortfolioAnalyzer {
    async fn analyze_portfolio(
        &self,
        handle: &str,
        job_role: &str,
    ) -> Result<PortfolioData, CapabilityError> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(CapabilityError::Fetch(
                "applicant has no portfolio handle".to_string(),
            ));
        }

        let repos = self.fetch_repos(handle).await?;
        debug!("Fetched {} repositories for {handle}", repos.len());

        let repositories = serde_json::to_string_pretty(&repos)
            .map_err(|e| CapabilityError::Inference(format!("cannot encode repositories: {e}")))?;
        let prompt = PORTFOLIO_PROMPT_TEMPLATE
            .replace("{job_role}", job_role)
            .replace("{repositories}", &repositories);
        let system = format!("{PORTFOLIO_SYSTEM} {JSON_ONLY_SYSTEM}");

        let structured = self
            .llm
            .call_structured::<PortfolioAssessment>(&prompt, &system)
            .await
            .map_err(|e| CapabilityError::Inference(format!("portfolio assessment call failed: {e}")))?;

        match structured {
            Structured::Parsed(assessment) => Ok(assessment.into()),
            Structured::Malformed(raw) => {
                warn!("Portfolio assessment for {handle} returned malformed output ({} chars)", raw.len());
                Err(CapabilityError::Inference(
                    "portfolio assessment output was not valid structured data".to_string(),
                ))
            }
        }
    }
}

/// Derives the GitHub handle from a profile URL; anything else is taken as the handle itself.
pub fn portfolio_handle_from_url(github_url: &str) -> String {
    let github_url = github_url.trim();
    match github_url.split_once("github.com/") {
        Some((_, rest)) => rest.split('/').next().unwrap_or_default().to_string(),
        None => github_url.to_string(),
    }
}
