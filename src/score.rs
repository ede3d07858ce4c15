//! Quality score evaluation.
//!
//! `score = 10.0 - ((5*error + warning + refactor + convention) / S) * 10.0`
//! where `S` is the statement count. Unbounded below; exactly 10.0 when there
//! are no findings. A zero statement count is defined to score 10.0 ("no
//! statements, no problems") rather than dividing by zero.

use crate::models::SeverityCounts;

/// Compute the quality score for an aggregate. Pure.
pub fn score(counts: &SeverityCounts, statements: usize) -> f64 {
    let penalty = counts.weighted_total();
    if penalty == 0 || statements == 0 {
        return 10.0;
    }
    10.0 - (penalty as f64 / statements as f64) * 10.0
}

/// Whether a score clears the configured `fail-under` bar.
pub fn passes(score: f64, fail_under: f64) -> bool {
    score >= fail_under
}
