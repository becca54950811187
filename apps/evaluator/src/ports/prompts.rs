// Prompt constants for the model-backed capability backends.
// Combined with llm_client::prompts::JSON_ONLY_SYSTEM at call time.

/// System role for resume extraction.
pub const RESUME_EXTRACT_SYSTEM: &str =
    "You are a hiring assistant that extracts structured facts from resumes.";

/// Resume extraction prompt. Replace `{resume_text}` before sending.
pub const RESUME_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract the following from the resume text below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "skills": ["Python", "PostgreSQL"],
  "years_of_experience": 4,
  "primary_role": "Backend Engineer",
  "tech_stack": ["FastAPI", "Docker"]
}

Rules:
- "skills" lists individual technologies and competencies, one per item.
- Use 0 for years_of_experience when it cannot be determined.
- Use null for primary_role when it cannot be determined.

Resume:
{resume_text}"#;

/// System role for portfolio assessment.
pub const PORTFOLIO_SYSTEM: &str =
    "You are a senior engineer evaluating public code portfolios for hiring.";

/// Portfolio assessment prompt. Replace `{job_role}` and `{repositories}` before sending.
pub const PORTFOLIO_PROMPT_TEMPLATE: &str = r#"You are evaluating a GitHub profile for a {job_role} role.

Repositories (name, description, language, stars):
{repositories}

Return a JSON object with this EXACT schema (no extra fields):
{
  "portfolio_score": 72,
  "strengths": ["Consistent Go services with tests"],
  "weaknesses": ["Little frontend work"],
  "insight": "One or two sentences of hiring insight."
}

"portfolio_score" is an integer from 0 to 100."#;
