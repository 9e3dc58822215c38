//! Lifecycle of a single selection run.
//!
//! ```text
//! COLLECTED -> FILTERED -> SCORED -> SELECTED -> COMMITTED
//!     \___________\__________\__________\_____-> DISCARDED
//! ```
//!
//! The run itself is never persisted. History is only read until
//! [`Run::commit`], which the caller invokes after the newsletter has been
//! published. A failed commit leaves the run in `SELECTED` so the caller can
//! retry it.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::{error, info, instrument, warn};

use crate::error::{Error, Result};
use crate::filter::{FilterOptions, FilterReport, filter_with};
use crate::history::HistoryStore;
use crate::models::{HeadlineCandidate, HistoryEntry, ScoredCandidate, Selection};
use crate::scorer::Scorer;
use crate::selector::select;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Collected,
    Filtered,
    Scored,
    Selected,
    Committed,
    Discarded,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Committed | RunState::Discarded)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Collected => "COLLECTED",
            RunState::Filtered => "FILTERED",
            RunState::Scored => "SCORED",
            RunState::Selected => "SELECTED",
            RunState::Committed => "COMMITTED",
            RunState::Discarded => "DISCARDED",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Run {
    state: RunState,
    candidates: Vec<HeadlineCandidate>,
    scored: Vec<ScoredCandidate>,
    winner: Option<ScoredCandidate>,
    filter_report: Option<FilterReport>,
    discard_reason: Option<String>,
}

impl Run {
    /// Start a run from the raw candidates of the search stage.
    pub fn collect(candidates: Vec<HeadlineCandidate>) -> Self {
        info!(candidates = candidates.len(), state = %RunState::Collected, "Run started");
        Self {
            state: RunState::Collected,
            candidates,
            scored: Vec::new(),
            winner: None,
            filter_report: None,
            discard_reason: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Candidates still in play for the current state.
    pub fn candidates(&self) -> &[HeadlineCandidate] {
        &self.candidates
    }

    pub fn scored(&self) -> &[ScoredCandidate] {
        &self.scored
    }

    pub fn winner(&self) -> Option<&ScoredCandidate> {
        self.winner.as_ref()
    }

    pub fn filter_report(&self) -> Option<FilterReport> {
        self.filter_report
    }

    pub fn discard_reason(&self) -> Option<&str> {
        self.discard_reason.as_deref()
    }

    fn expect_state(&self, expected: RunState, to: RunState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::OutOfOrder {
                from: self.state,
                to,
            })
        }
    }

    fn transition(&mut self, to: RunState) {
        info!(from = %self.state, to = %to, "Run transition");
        self.state = to;
    }

    /// Drop candidates already in history or repeated within the batch.
    /// At most `max_candidates` survivors move on, in input order.
    pub fn filter(
        &mut self,
        history: &HistoryStore,
        options: FilterOptions,
        max_candidates: Option<usize>,
    ) -> Result<&[HeadlineCandidate]> {
        self.expect_state(RunState::Collected, RunState::Filtered)?;
        let (mut kept, report) = filter_with(std::mem::take(&mut self.candidates), history, options);
        if let Some(max) = max_candidates {
            kept.truncate(max);
        }
        if kept.is_empty() {
            warn!("Every candidate was filtered out; consider widening the search");
        }
        self.candidates = kept;
        self.filter_report = Some(report);
        self.transition(RunState::Filtered);
        Ok(&self.candidates)
    }

    pub fn score(&mut self, scorer: &Scorer<'_>) -> Result<&[ScoredCandidate]> {
        self.expect_state(RunState::Filtered, RunState::Scored)?;
        self.scored = scorer.score_all(&self.candidates);
        self.transition(RunState::Scored);
        Ok(&self.scored)
    }

    /// Pick the winner. An empty candidate set discards the run.
    #[instrument(level = "info", skip_all)]
    pub fn select(&mut self) -> Result<&ScoredCandidate> {
        self.expect_state(RunState::Scored, RunState::Selected)?;
        match select(&self.scored) {
            Ok(winner) => {
                self.transition(RunState::Selected);
                Ok(&*self.winner.insert(winner))
            }
            Err(e) => {
                self.discard(e.to_string());
                Err(e)
            }
        }
    }

    /// Hand-off record for the article-writing stage.
    pub fn selection(&self, scorer: &Scorer<'_>, selected_at: DateTime<Utc>) -> Option<Selection> {
        self.winner.as_ref().map(|w| Selection {
            headline: w.candidate.text().to_string(),
            source_url: w.candidate.source_url().to_string(),
            pattern_code: w.pattern_code,
            pattern_description: scorer.rubric().describe(w.pattern_code).map(str::to_string),
            score: w.score,
            discovered_at: w.candidate.discovered_at(),
            selected_at,
        })
    }

    /// Record the winner in history. Call only after publication succeeded.
    #[instrument(level = "info", skip_all, fields(path = %history.path().display()))]
    pub fn commit(&mut self, history: &mut HistoryStore, used_at: DateTime<Utc>) -> Result<HistoryEntry> {
        self.expect_state(RunState::Selected, RunState::Committed)?;
        let Some(winner) = self.winner.as_ref() else {
            return Err(Error::OutOfOrder {
                from: self.state,
                to: RunState::Committed,
            });
        };
        let entry = HistoryEntry::new(
            winner.candidate.text(),
            winner.candidate.source_url(),
            used_at,
            winner.pattern_code,
        );
        if let Err(e) = history.commit(entry.clone()) {
            error!(event_kind = e.kind(), error = %e, "Commit failed; run stays SELECTED");
            return Err(e);
        }
        self.transition(RunState::Committed);
        Ok(entry)
    }

    /// Abandon the run. History is never touched.
    pub fn discard(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() {
            return;
        }
        let reason = reason.into();
        warn!(from = %self.state, %reason, "Run discarded");
        self.discard_reason = Some(reason);
        self.state = RunState::Discarded;
    }
}
