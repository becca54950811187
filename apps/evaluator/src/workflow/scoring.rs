use crate::models::evaluation::Decision;

/// Weight of the skill match score, in tenths.
const SKILL_WEIGHT: u32 = 6;
/// Weight of the portfolio score, in tenths.
const PORTFOLIO_WEIGHT: u32 = 4;

/// floor(0.6 * skill + 0.4 * portfolio), computed in integers so it truncates exactly.
/// Inputs above 100 are clamped.
pub fn final_score(skill_match_score: u32, portfolio_score: u32) -> u32 {
    (SKILL_WEIGHT * skill_match_score.min(100) + PORTFOLIO_WEIGHT * portfolio_score.min(100)) / 10
}

pub fn decide(skill_match_score: u32, portfolio_score: u32) -> (u32, Decision) {
    let score = final_score(skill_match_score, portfolio_score);
    (score, Decision::from_score(score))
}
