//! Data models for headline candidates and their selection lifecycle.
//!
//! This module defines the core data structures used throughout the crate:
//! - [`HeadlineCandidate`]: A raw headline as handed over by the search stage
//! - [`PatternCode`]: Davis Index classification (`D1`..`Dn` or unclassified)
//! - [`ScoredCandidate`]: A candidate after rubric scoring
//! - [`HistoryEntry`]: One persisted record of a published headline
//! - [`Selection`]: The hand-off record for the article-writing stage
//!
//! Candidates accept the field names of the raw search results (`title`,
//! `url`, `date`) as aliases so the retrieval output can be fed in unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::normalize_headline;

/// A single discovered news item considered for selection.
///
/// Immutable once created: fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeadlineCandidate {
    #[serde(alias = "title")]
    text: String,
    #[serde(alias = "url", default)]
    source_url: String,
    #[serde(alias = "date")]
    discovered_at: DateTime<Utc>,
}

impl HeadlineCandidate {
    pub fn new(
        text: impl Into<String>,
        source_url: impl Into<String>,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.into(),
            discovered_at,
        }
    }

    /// The headline exactly as discovered.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// Lowercased, whitespace-collapsed form used for all duplicate checks.
    pub fn normalized_text(&self) -> String {
        normalize_headline(&self.text)
    }
}

/// Davis Index classification of a headline's narrative pattern.
///
/// Serialized as `"D<n>"` or `"UNCLASSIFIED"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum PatternCode {
    Davis(u16),
    Unclassified,
}

impl PatternCode {
    pub fn is_classified(&self) -> bool {
        !matches!(self, PatternCode::Unclassified)
    }
}

impl fmt::Display for PatternCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternCode::Davis(n) => write!(f, "D{n}"),
            PatternCode::Unclassified => f.write_str("UNCLASSIFIED"),
        }
    }
}

impl FromStr for PatternCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unclassified") {
            return Ok(PatternCode::Unclassified);
        }
        let digits = s
            .strip_prefix('D')
            .or_else(|| s.strip_prefix('d'))
            .ok_or_else(|| format!("pattern code must look like D<n>, got {s:?}"))?;
        match digits.parse::<u16>() {
            Ok(n) if n >= 1 => Ok(PatternCode::Davis(n)),
            _ => Err(format!("pattern code must look like D<n> with n >= 1, got {s:?}")),
        }
    }
}

impl TryFrom<String> for PatternCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatternCode> for String {
    fn from(code: PatternCode) -> Self {
        code.to_string()
    }
}

/// A candidate after scoring. Derived per run, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: HeadlineCandidate,
    /// Primary classification: the heaviest matched rule, or unclassified.
    pub pattern_code: PatternCode,
    /// Every matched rule in rubric order.
    pub matched_codes: Vec<PatternCode>,
    pub score: f64,
}

/// One persisted record of a headline that went out in a newsletter.
///
/// `normalized_text` is the uniqueness key of the history store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryEntry {
    pub normalized_text: String,
    /// The headline as published, kept for people reading the file.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_url: String,
    pub used_at: DateTime<Utc>,
    pub pattern_code: PatternCode,
}

impl HistoryEntry {
    pub fn new(
        title: &str,
        source_url: &str,
        used_at: DateTime<Utc>,
        pattern_code: PatternCode,
    ) -> Self {
        Self {
            normalized_text: normalize_headline(title),
            title: title.to_string(),
            source_url: source_url.to_string(),
            used_at,
            pattern_code,
        }
    }
}

/// The winning headline handed to the article-writing stage.
///
/// Written as JSON by `select` and read back by `commit` once the
/// newsletter has actually gone out.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Selection {
    pub headline: String,
    pub source_url: String,
    pub pattern_code: PatternCode,
    /// Human description of the pattern, for the writer prompt.
    #[serde(default)]
    pub pattern_description: Option<String>,
    pub score: f64,
    pub discovered_at: DateTime<Utc>,
    pub selected_at: DateTime<Utc>,
}

impl Selection {
    /// The history record to append once publication has succeeded.
    pub fn to_history_entry(&self, used_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry::new(&self.headline, &self.source_url, used_at, self.pattern_code)
    }
}
