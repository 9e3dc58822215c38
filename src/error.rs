//! Error taxonomy for the headline selection core.
//!
//! Every failure the core can produce is a distinct variant so the
//! orchestrating caller can tell an operator-actionable problem (a corrupt
//! history file) apart from a "try again next week" one (no candidates).
//! Nothing in the core retries; retries belong to the caller.

use std::path::PathBuf;

use crate::pipeline::RunState;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persisted history could not be read or parsed. Fatal for the run:
    /// proceeding with a guessed history risks re-publishing a recent headline.
    #[error("history store {path} is corrupt (line {line}): {reason}")]
    StorageCorrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Writing the history failed after a successful publication. The store on
    /// disk still holds the pre-commit sequence.
    #[error("failed to write history store {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The selector received an empty candidate set.
    #[error("no candidates left to select from")]
    NoCandidates,

    /// A commit would break the one-entry-per-normalized-headline invariant.
    #[error("headline already recorded in history: {normalized_text:?}")]
    DuplicateEntry { normalized_text: String },

    /// A commit carried a headline that normalizes to nothing.
    #[error("refusing to record an empty headline")]
    EmptyHeadline,

    #[error("invalid rubric: {0}")]
    Rubric(String),

    #[error("invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// A run transition was requested from the wrong state.
    #[error("cannot move run from {from} to {to}")]
    OutOfOrder { from: RunState, to: RunState },

    /// Candidate or selection input supplied by a collaborator could not be read.
    #[error("invalid input {path}: {reason}")]
    Input { path: PathBuf, reason: String },
}

impl Error {
    /// Process exit code the binary reports for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::StorageCorrupt { .. } => 2,
            Error::NoCandidates => 3,
            Error::StorageWrite { .. } => 4,
            _ => 1,
        }
    }

    /// Short machine-readable tag used as the `event_kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::StorageCorrupt { .. } => "history.corrupt",
            Error::StorageWrite { .. } => "history.write_failed",
            Error::NoCandidates => "selection.no_candidates",
            Error::DuplicateEntry { .. } => "history.duplicate",
            Error::EmptyHeadline => "history.empty_headline",
            Error::Rubric(_) => "rubric.invalid",
            Error::Config { .. } => "config.invalid",
            Error::OutOfOrder { .. } => "run.out_of_order",
            Error::Input { .. } => "input.invalid",
        }
    }
}
