//! Deterministic winner selection.
//!
//! Highest score wins. Ties are broken, in order, by:
//! 1. a classified pattern code over [`PatternCode::Unclassified`]
//! 2. the earlier `discovered_at`
//! 3. the earlier position in the input
//!
//! No randomness: identical input always yields the identical winner.

use std::cmp::Ordering;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::models::ScoredCandidate;

/// Ordering where `Greater` means "better pick". Input position is not part
/// of it; [`select`] resolves full ties by keeping the earlier candidate.
pub fn preference(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.pattern_code.is_classified().cmp(&b.pattern_code.is_classified()))
        .then_with(|| b.candidate.discovered_at().cmp(&a.candidate.discovered_at()))
}

/// Pick the single best candidate. Pure: no history is touched.
#[instrument(level = "info", skip_all, fields(candidates = scored.len()))]
pub fn select(scored: &[ScoredCandidate]) -> Result<ScoredCandidate> {
    let winner = rank(scored).into_iter().next().ok_or(Error::NoCandidates)?;
    info!(
        headline = %winner.candidate.text(),
        pattern_code = %winner.pattern_code,
        score = winner.score,
        "Selected headline"
    );
    Ok(winner.clone())
}

/// All candidates, best first. Equal candidates keep their input order.
pub fn rank(scored: &[ScoredCandidate]) -> Vec<&ScoredCandidate> {
    let mut ranked: Vec<&ScoredCandidate> = scored.iter().collect();
    // Stable sort keeps input order among equals.
    ranked.sort_by(|a, b| preference(b, a));
    ranked
}
