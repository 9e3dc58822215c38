//! Utility functions for headline normalization, URL handling, and file system operations.
//!
//! This module provides helper functions used throughout the crate:
//! - Headline normalization, the single definition of "same headline"
//! - Source-domain extraction for source diversity
//! - String truncation for logging
//! - Directory preparation for output and history files

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a headline for duplicate detection.
///
/// Lowercases, collapses every run of whitespace to a single space and trims.
/// Two headlines are the same headline exactly when their normalized forms
/// are equal.
///
/// # Examples
///
/// ```
/// use uncurve_headlines::utils::normalize_headline;
/// assert_eq!(normalize_headline("  Why\tWe   LIE "), "why we lie");
/// ```
pub fn normalize_headline(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Second-level labels that sit under a country code, as in `co.uk` or `com.au`.
const SECOND_LEVEL_SUFFIXES: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// Extract the registrable-looking domain from a source URL.
///
/// For example: `"https://www.nature.com/articles/x"` -> `"nature"` and
/// `"https://www.bbc.co.uk/news"` -> `"bbc"`. Only the common
/// `<label>.<cc>` second-level suffixes are recognized; this is not a full
/// public suffix list.
/// Returns `None` for empty or unparseable URLs.
pub fn source_domain(source_url: &str) -> Option<String> {
    let parsed = url::Url::parse(source_url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let parts: Vec<&str> = host.split('.').collect();
    let n = parts.len();
    // "lite.cnn.com" -> "cnn", "cnn.com" -> "cnn", "www.abc.net.au" -> "abc"
    let label = if n >= 3 && parts[n - 1].len() == 2 && SECOND_LEVEL_SUFFIXES.contains(&parts[n - 2]) {
        parts[n - 3]
    } else if n >= 2 {
        parts[n - 2]
    } else {
        host.as_str()
    };
    Some(label.to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Make sure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            debug!(dir = %parent.display(), "Ensured parent directory");
            Ok(())
        }
        _ => Ok(()),
    }
}
