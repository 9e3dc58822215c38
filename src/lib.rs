//! # Un:Curve headline selection
//!
//! The deterministic core of the Un:Curve weekly newsletter: given the
//! headlines the search stage found, pick the one the newsletter will be
//! written about, and remember it so it never goes out twice.
//!
//! ## Architecture
//!
//! 1. **History**: load the JSON Lines ledger of published headlines
//! 2. **Filter**: drop candidates already published or repeated in the batch
//! 3. **Score**: apply the declarative Davis Index rubric plus a recency bonus
//! 4. **Select**: take the best candidate with a fully deterministic tie-break
//! 5. **Commit**: after the newsletter went out, append the winner to history
//!
//! [`pipeline::Run`] enforces that order. Searching, article writing and
//! webhook delivery live outside this crate.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod handoff;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod rubric;
pub mod scorer;
pub mod selector;
pub mod utils;

pub use error::{Error, Result};
pub use history::HistoryStore;
pub use models::{HeadlineCandidate, HistoryEntry, PatternCode, ScoredCandidate, Selection};
pub use pipeline::{Run, RunState};
pub use rubric::Rubric;
pub use scorer::Scorer;
