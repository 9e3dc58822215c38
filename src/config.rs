//! YAML configuration.
//!
//! Every field is optional; a missing file section falls back to the
//! defaults below.
//!
//! ```yaml
//! history_path: /var/lib/uncurve/headline_history.jsonl
//! rubric_path: /etc/uncurve/rubric.yaml
//! recency_window_days: 7
//! recency_bonus: 1.0
//! source_repeat_penalty: 2.0
//! recent_source_window: 5
//! match_source_url: true
//! max_candidates: 10
//! ```

use chrono::Duration;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::filter::FilterOptions;
use crate::rubric::Rubric;
use crate::scorer::RecencyPolicy;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub history_path: PathBuf,
    pub rubric_path: Option<PathBuf>,
    pub recency_window_days: i64,
    pub recency_bonus: f64,
    pub source_repeat_penalty: f64,
    pub recent_source_window: usize,
    pub match_source_url: bool,
    pub max_candidates: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("headline_history.jsonl"),
            rubric_path: None,
            recency_window_days: 7,
            recency_bonus: 1.0,
            source_repeat_penalty: 0.0,
            recent_source_window: 5,
            match_source_url: true,
            max_candidates: Some(10),
        }
    }
}

impl AppConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        info!(history_path = %config.history_path.display(), "Loaded configuration");
        Ok(config)
    }

    fn from_yaml_str(raw: &str) -> std::result::Result<Self, String> {
        // An empty file is a valid "all defaults" config.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
        if config.recency_window_days < 0 {
            return Err("recency_window_days must not be negative".to_string());
        }
        if Duration::try_days(config.recency_window_days).is_none() {
            return Err(format!(
                "recency_window_days {} is out of range",
                config.recency_window_days
            ));
        }
        if !config.recency_bonus.is_finite() || config.recency_bonus < 0.0 {
            return Err("recency_bonus must be a non-negative number".to_string());
        }
        if !config.source_repeat_penalty.is_finite() || config.source_repeat_penalty < 0.0 {
            return Err("source_repeat_penalty must be a non-negative number".to_string());
        }
        Ok(config)
    }

    pub fn recency(&self) -> RecencyPolicy {
        RecencyPolicy {
            // Out-of-range values are rejected on load; saturate for hand-built configs.
            window: Duration::try_days(self.recency_window_days).unwrap_or(Duration::MAX),
            bonus: self.recency_bonus,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            match_source_url: self.match_source_url,
        }
    }

    /// The configured rubric file, or the built-in Davis Index.
    pub fn rubric(&self) -> Result<Rubric> {
        match &self.rubric_path {
            Some(path) => Rubric::from_file(path),
            None => Rubric::builtin(),
        }
    }
}
