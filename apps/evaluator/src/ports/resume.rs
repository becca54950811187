//! Resume extraction backend. Reads the stored resume and asks the model for structured skills.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, Structured};
use crate::models::evaluation::ResumeData;
use crate::ports::prompts::{RESUME_EXTRACT_PROMPT_TEMPLATE, RESUME_EXTRACT_SYSTEM};
use crate::ports::{CapabilityError, ResumeExtractor};

/// Longest resume text sent to the model.
const MAX_RESUME_CHARS: usize = 30_000;

/// Resume file extensions the extractor can read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

pub struct LlmResumeExtractor {
    llm: LlmClient,
}

impl LlmResumeExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeExtractor for LlmResumeExtractor {
    async fn extract_resume_skills(&self, resume_path: &str) -> Result<ResumeData, CapabilityError> {
        let text = read_resume_text(Path::new(resume_path)).await?;
        debug!("Read {} chars from resume {resume_path}", text.len());

        let prompt = RESUME_EXTRACT_PROMPT_TEMPLATE.replace("{resume_text}", &text);
        let system = format!("{RESUME_EXTRACT_SYSTEM} {JSON_ONLY_SYSTEM}");

        let structured = self
            .llm
            .call_structured::<ResumeData>(&prompt, &system)
            .await
            .map_err(|e| CapabilityError::Inference(format!("resume extraction call failed: {e}")))?;

        match structured {
            Structured::Parsed(data) => Ok(normalize(data)),
            Structured::Malformed(raw) => {
                warn!("Resume extraction returned malformed output ({} chars)", raw.len());
                Err(CapabilityError::Inference(
                    "resume extraction output was not valid structured data".to_string(),
                ))
            }
        }
    }
}

/// Reads resume text from a `.pdf` or `.txt` file.
pub async fn read_resume_text(path: &Path) -> Result<String, CapabilityError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => {
            let owned: PathBuf = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                .await
                .map_err(|e| CapabilityError::Extraction(format!("PDF reader task failed: {e}")))?
                .map_err(|e| {
                    CapabilityError::Extraction(format!(
                        "failed to extract text from {}: {e}",
                        path.display()
                    ))
                })?
        }
        "txt" => tokio::fs::read_to_string(path).await.map_err(|e| {
            CapabilityError::Extraction(format!("failed to read {}: {e}", path.display()))
        })?,
        other => {
            return Err(CapabilityError::Extraction(format!(
                "unsupported resume format '{other}'"
            )))
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(CapabilityError::Extraction(format!(
            "no text found in {}",
            path.display()
        )));
    }

    Ok(text.chars().take(MAX_RESUME_CHARS).collect())
}

fn normalize(mut data: ResumeData) -> ResumeData {
    data.skills = data
        .skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if data.years_of_experience.is_nan() || data.years_of_experience < 0.0 {
        data.years_of_experience = 0.0;
    }
    data
}
