use std::collections::BTreeSet;

use crate::models::evaluation::SkillMatchResult;

/// Case-insensitive set comparison of job skills against resume skills.
///
/// `matched` and `missing` partition the lowercased job skills; duplicates collapse
/// and blank entries are ignored. Score = round(100 * |matched| / |job skills|),
/// and an empty job skill list scores 0 with both sets empty.
pub fn match_skills(job_skills: &[String], resume_skills: &[String]) -> SkillMatchResult {
    let job = lowercase_set(job_skills);
    if job.is_empty() {
        return SkillMatchResult::default();
    }
    let resume = lowercase_set(resume_skills);

    let total = job.len();
    let (matched, missing): (Vec<String>, Vec<String>) =
        job.into_iter().partition(|skill| resume.contains(skill));

    // integer round-half-up of 100 * matched / total
    let score = ((200 * matched.len() + total) / (2 * total)) as u32;

    SkillMatchResult {
        matched_skills: matched,
        missing_skills: missing,
        skill_match_score: score,
    }
}

fn lowercase_set(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}
