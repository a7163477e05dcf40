use crate::facts::ProjectFacts;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BASELINE_POINTS: u8 = 4;
pub const ACTUAL_COST_POINTS: u8 = 3;
pub const PERT_QUALITY_POINTS: u8 = 3;

/// Share of degenerate estimates at or above which PERT quality earns nothing.
pub const PERT_ERROR_TOLERANCE: f64 = 0.2;

/// Data-integrity score in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityScore(u8);

impl IntegrityScore {
    pub const MAX: u8 = BASELINE_POINTS + ACTUAL_COST_POINTS + PERT_QUALITY_POINTS;

    /// Every value the band weights can produce. 9 is not among them: the
    /// only bands are 4, 3 and 3.
    pub const REACHABLE: [u8; 6] = [0, 3, 4, 6, 7, 10];

    /// Each band is all-or-nothing and the bands are summed.
    pub fn of(facts: &ProjectFacts) -> Self {
        let mut score = 0;
        if facts.baseline_count > 0 {
            score += BASELINE_POINTS;
        }
        if facts.actual_cost > 0.0 {
            score += ACTUAL_COST_POINTS;
        }
        if facts.task_count() > 0 && facts.pert_error_ratio() < PERT_ERROR_TOLERANCE {
            score += PERT_QUALITY_POINTS;
        }
        Self(score)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<IntegrityScore> for u8 {
    fn from(score: IntegrityScore) -> Self {
        score.0
    }
}

impl fmt::Display for IntegrityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}
