//! Declarative Davis Index rubric.
//!
//! The rubric is data, not control flow: an ordered list of
//! `pattern_code -> (predicate, weight)` rules loaded from YAML. Adding a
//! pattern means adding a rule to the file; the scoring algorithm in
//! [`crate::scorer`] never changes.
//!
//! YAML shape:
//!
//! ```yaml
//! rules:
//!   - code: D2
//!     description: Counter-intuitive reversal
//!     any_of: ['\brevisit(ed)?\b', '\bbackfires?\b']
//!     none_of: []
//!     weight: 10
//! ```
//!
//! A built-in rubric ships with the binary (`config/rubric.yaml`).

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::models::PatternCode;

const BUILTIN_RUBRIC: &str = include_str!("../config/rubric.yaml");

#[derive(Debug, Deserialize)]
struct RubricFile {
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    code: PatternCode,
    #[serde(default)]
    description: String,
    #[serde(default)]
    any_of: Vec<String>,
    #[serde(default)]
    none_of: Vec<String>,
    weight: f64,
}

/// Match condition of a rule over the headline text.
#[derive(Debug, Clone)]
pub struct Predicate {
    any_of: Vec<Regex>,
    none_of: Vec<Regex>,
}

impl Predicate {
    pub fn matches(&self, text: &str) -> bool {
        self.any_of.iter().any(|re| re.is_match(text))
            && !self.none_of.iter().any(|re| re.is_match(text))
    }
}

#[derive(Debug, Clone)]
pub struct RubricRule {
    pub code: PatternCode,
    pub description: String,
    pub predicate: Predicate,
    pub weight: f64,
}

/// Ordered, validated rule set.
#[derive(Debug, Clone)]
pub struct Rubric {
    rules: Vec<RubricRule>,
}

impl Rubric {
    /// The Davis Index rubric embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_RUBRIC)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Rubric(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        let rubric = Self::from_yaml_str(&raw)?;
        info!(rules = rubric.len(), "Loaded rubric file");
        Ok(rubric)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: RubricFile =
            serde_yaml::from_str(raw).map_err(|e| Error::Rubric(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(file.rules.len());
        for spec in file.rules {
            if !spec.code.is_classified() {
                return Err(Error::Rubric(format!(
                    "rule code {} is reserved for unmatched headlines",
                    spec.code
                )));
            }
            if !seen.insert(spec.code) {
                return Err(Error::Rubric(format!("duplicate rule code {}", spec.code)));
            }
            if !spec.weight.is_finite() || spec.weight < 0.0 {
                return Err(Error::Rubric(format!(
                    "rule {} has invalid weight {}",
                    spec.code, spec.weight
                )));
            }
            if spec.any_of.is_empty() {
                return Err(Error::Rubric(format!(
                    "rule {} needs at least one any_of pattern",
                    spec.code
                )));
            }
            let predicate = Predicate {
                any_of: compile_all(spec.code, &spec.any_of)?,
                none_of: compile_all(spec.code, &spec.none_of)?,
            };
            debug!(code = %spec.code, weight = spec.weight, "Compiled rubric rule");
            rules.push(RubricRule {
                code: spec.code,
                description: spec.description,
                predicate,
                weight: spec.weight,
            });
        }
        Ok(Self { rules })
    }

    /// Rules in declared evaluation order.
    pub fn rules(&self) -> &[RubricRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn describe(&self, code: PatternCode) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.code == code)
            .map(|r| r.description.as_str())
    }

    /// Rules whose predicate matches `text`, in declared order.
    pub fn matching<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a RubricRule> + 'a {
        self.rules.iter().filter(move |r| r.predicate.matches(text))
    }
}

fn compile_all(code: PatternCode, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Rubric(format!("rule {code}: bad pattern {p:?}: {e}")))
        })
        .collect()
}
