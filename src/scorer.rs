//! Rubric scoring for filtered candidates.
//!
//! `score = sum(matched rule weights) + recency bonus - source repeat penalty`
//!
//! Rules are evaluated in rubric order. The primary pattern code is the
//! heaviest matched rule, the earlier rule winning equal weights. A candidate
//! that matches nothing is still scored, as [`PatternCode::Unclassified`].

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::models::{HeadlineCandidate, PatternCode, ScoredCandidate};
use crate::rubric::Rubric;
use crate::utils::source_domain;

/// Bonus for fresh headlines. Monotonic: a newer headline never gets less
/// than an older one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyPolicy {
    pub window: Duration,
    pub bonus: f64,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            window: Duration::days(7),
            bonus: 1.0,
        }
    }
}

impl RecencyPolicy {
    pub fn bonus_for(&self, discovered_at: DateTime<Utc>, reference: DateTime<Utc>) -> f64 {
        // Timestamps in the future count as fresh.
        if reference - discovered_at <= self.window {
            self.bonus
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scorer<'r> {
    rubric: &'r Rubric,
    reference_time: DateTime<Utc>,
    recency: RecencyPolicy,
    recent_domains: HashSet<String>,
    source_repeat_penalty: f64,
}

impl<'r> Scorer<'r> {
    /// Scorer judging freshness relative to `reference_time` (normally "now").
    pub fn new(rubric: &'r Rubric, reference_time: DateTime<Utc>) -> Self {
        Self {
            rubric,
            reference_time,
            recency: RecencyPolicy::default(),
            recent_domains: HashSet::new(),
            source_repeat_penalty: 0.0,
        }
    }

    pub fn with_recency(mut self, recency: RecencyPolicy) -> Self {
        self.recency = recency;
        self
    }

    /// Penalize candidates from domains the last few newsletters already used.
    pub fn with_source_diversity(
        mut self,
        recent_domains: impl IntoIterator<Item = String>,
        penalty: f64,
    ) -> Self {
        self.recent_domains = recent_domains.into_iter().collect();
        self.source_repeat_penalty = penalty.max(0.0);
        self
    }

    pub fn rubric(&self) -> &Rubric {
        self.rubric
    }

    #[instrument(level = "debug", skip_all, fields(headline = %candidate.text()))]
    pub fn score(&self, candidate: &HeadlineCandidate) -> ScoredCandidate {
        let mut total = 0.0;
        let mut matched_codes = Vec::new();
        let mut primary: Option<(PatternCode, f64)> = None;

        for rule in self.rubric.matching(candidate.text()) {
            total += rule.weight;
            matched_codes.push(rule.code);
            if primary.is_none_or(|(_, w)| rule.weight > w) {
                primary = Some((rule.code, rule.weight));
            }
        }

        let recency = self
            .recency
            .bonus_for(candidate.discovered_at(), self.reference_time);
        total += recency;

        let repeated_source = source_domain(candidate.source_url())
            .is_some_and(|d| self.recent_domains.contains(&d));
        if repeated_source {
            total -= self.source_repeat_penalty;
        }

        let pattern_code = primary
            .map(|(code, _)| code)
            .unwrap_or(PatternCode::Unclassified);
        debug!(%pattern_code, matched = matched_codes.len(), recency, repeated_source, score = total, "Scored candidate");

        ScoredCandidate {
            candidate: candidate.clone(),
            pattern_code,
            matched_codes,
            score: total,
        }
    }

    /// Score a batch, preserving input order.
    pub fn score_all(&self, candidates: &[HeadlineCandidate]) -> Vec<ScoredCandidate> {
        candidates.iter().map(|c| self.score(c)).collect()
    }
}
