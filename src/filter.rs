//! Candidate filtering against history and within the batch.
//!
//! Only exact matches on the normalized headline count as duplicates.
//! Fuzzy matching is deliberately not attempted.

use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::history::HistoryStore;
use crate::models::HeadlineCandidate;
use crate::utils::truncate_for_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Also drop candidates whose source URL is already in history.
    pub match_source_url: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            match_source_url: true,
        }
    }
}

/// Counts of what the filter removed, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub kept: usize,
    pub blank: usize,
    pub seen_before: usize,
    pub batch_duplicates: usize,
}

/// Drop candidates already used in history and repeats within the batch.
///
/// The first occurrence of a headline wins and input order is preserved.
/// An empty result is not an error; the caller decides what it means.
pub fn filter(candidates: Vec<HeadlineCandidate>, history: &HistoryStore) -> Vec<HeadlineCandidate> {
    filter_with(candidates, history, FilterOptions::default()).0
}

#[instrument(level = "info", skip_all, fields(incoming = candidates.len()))]
pub fn filter_with(
    candidates: Vec<HeadlineCandidate>,
    history: &HistoryStore,
    options: FilterOptions,
) -> (Vec<HeadlineCandidate>, FilterReport) {
    let mut report = FilterReport::default();
    let incoming = candidates.len();

    // Dedup the batch first so a repeat cannot outlive its dropped original.
    let unique: Vec<HeadlineCandidate> = candidates
        .into_iter()
        .filter(|c| {
            let blank = c.normalized_text().is_empty();
            if blank {
                report.blank += 1;
            }
            !blank
        })
        .unique_by(HeadlineCandidate::normalized_text)
        .collect();
    report.batch_duplicates = incoming - report.blank - unique.len();

    let kept: Vec<HeadlineCandidate> = unique
        .into_iter()
        .filter(|c| {
            let used = history.contains(c.text())
                || (options.match_source_url && history.contains_url(c.source_url()));
            if used {
                debug!(headline = %truncate_for_log(c.text(), 120), "Already used; dropping");
                report.seen_before += 1;
            }
            !used
        })
        .collect();
    report.kept = kept.len();

    info!(
        incoming,
        kept = report.kept,
        seen_before = report.seen_before,
        batch_duplicates = report.batch_duplicates,
        blank = report.blank,
        "Filtered candidates"
    );
    (kept, report)
}
