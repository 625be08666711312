use crate::models::{Counters, MAX_STORED};

const EASY_WEIGHT: f64 = 10.0;
const MEDIUM_WEIGHT: f64 = 30.0;
const HARD_WEIGHT: f64 = 90.0;

const HARDNESS_CAP: f64 = 1.5;
const HARD_BONUS: f64 = 0.02;
const MEDIUM_BONUS: f64 = 0.005;

const GFG_MULTIPLIER: f64 = 8.5;
const GITHUB_REPO_POINTS: f64 = 375.0;

/// Per-platform contributions to a composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub hardness_bonus: f64,
    pub leetcode: u64,
    pub gfg: u64,
    pub github: u64,
}

impl ScoreBreakdown {
    /// Sum of the components, capped at [`MAX_STORED`].
    pub fn total(&self) -> u64 {
        self.leetcode
            .saturating_add(self.gfg)
            .saturating_add(self.github)
            .min(MAX_STORED)
    }
}

impl std::fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**Score Breakdown:**\n\
             \tLeetCode: {} (x{:.3} hardness bonus)\n\
             \tGFG: {}\n\
             \tGitHub: {}\n\
             \tTotal: {}",
            self.leetcode, self.hardness_bonus, self.gfg, self.github, self.total()
        )
    }
}

/// `f64::round` rounds halves away from zero, which is round-half-up for the
/// non-negative values produced here. Out-of-range results clamp to [`MAX_STORED`].
fn round(value: f64) -> u64 {
    (value.round() as u64).min(MAX_STORED)
}

pub fn breakdown(counters: &Counters) -> ScoreBreakdown {
    let easy = counters.easy_solved as f64;
    let medium = counters.medium_solved as f64;
    let hard = counters.hard_solved as f64;

    let lc_raw = EASY_WEIGHT * easy + MEDIUM_WEIGHT * medium + HARD_WEIGHT * hard;
    let hardness_bonus = HARDNESS_CAP.min(1.0 + HARD_BONUS * hard + MEDIUM_BONUS * medium);

    ScoreBreakdown {
        hardness_bonus,
        leetcode: round(lc_raw * hardness_bonus),
        gfg: round(counters.gfg_coding_score as f64 * GFG_MULTIPLIER),
        github: round(counters.github_repos as f64 * GITHUB_REPO_POINTS),
    }
}

/// Computes the composite score for a set of counters.
pub fn calculate(counters: &Counters) -> u64 {
    breakdown(counters).total()
}
