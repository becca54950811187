use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dispatch::DispatchMode;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub resume_upload_dir: PathBuf,
    pub dispatch_mode: DispatchMode,
    pub queue_poll_min: Duration,
    pub queue_poll_max: Duration,
    pub stage_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            github_token: optional_env("GITHUB_TOKEN"),
            github_api_url: optional_env("GITHUB_API_URL")
                .unwrap_or_else(|| "https://api.github.com".to_string()),
            resume_upload_dir: optional_env("RESUME_UPLOAD_DIR")
                .unwrap_or_else(|| "uploads/resumes".to_string())
                .into(),
            dispatch_mode: parse_env("DISPATCH_MODE", DispatchMode::Immediate)?,
            queue_poll_min: Duration::from_millis(parse_env("QUEUE_POLL_MIN_MS", 500)?),
            queue_poll_max: Duration::from_millis(parse_env("QUEUE_POLL_MAX_MS", 5000)?),
            stage_timeout: Duration::from_secs(parse_env("STAGE_TIMEOUT_SECS", 60)?),
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
