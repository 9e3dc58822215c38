//! Records exchanged with the collaborators around the core.
//!
//! - Input: a JSON array of candidates from the search stage.
//! - Output: the [`Selection`] for the article-writing stage. It is printed to
//!   stdout and, when an output directory is given, archived as
//!   `{output_dir}/{date}_selection.json` so a run can be inspected later.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::models::{HeadlineCandidate, Selection};

/// Read the candidate batch produced by the search stage.
///
/// Accepts either this crate's field names or the raw search-result names
/// (`title`, `url`, `date`); unknown fields such as `body` are ignored.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_candidates(path: &Path) -> Result<Vec<HeadlineCandidate>> {
    let raw = fs::read_to_string(path).map_err(|e| input_error(path, e))?;
    let candidates: Vec<HeadlineCandidate> =
        serde_json::from_str(&raw).map_err(|e| input_error(path, e))?;
    info!(count = candidates.len(), "Read candidates");
    Ok(candidates)
}

/// Write a [`Selection`] as pretty JSON into `output_dir`.
///
/// # Returns
///
/// The path written, or an I/O error if the directory cannot be created or
/// the file cannot be written.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub fn write_selection(selection: &Selection, output_dir: &Path) -> std::io::Result<PathBuf> {
    let json = serde_json::to_string_pretty(selection)?;

    if let Err(e) = fs::create_dir_all(output_dir) {
        error!(error = %e, "Failed to create output dir");
        return Err(e);
    }

    let date = selection.selected_at.date_naive();
    let path = output_dir.join(format!("{date}_selection.json"));
    fs::write(&path, json)?;
    info!(path = %path.display(), "Wrote selection");
    Ok(path)
}

/// Read back a selection written by [`write_selection`] or printed by `select`.
pub fn read_selection(path: &Path) -> Result<Selection> {
    let raw = fs::read_to_string(path).map_err(|e| input_error(path, e))?;
    serde_json::from_str(&raw).map_err(|e| input_error(path, e))
}

fn input_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatternCode;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_write_then_read_selection() {
        let dir = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2025, 6, 3, 8, 0, 0).unwrap();
        let selection = Selection {
            headline: "The Tipping Point Revisited".to_string(),
            source_url: "b".to_string(),
            pattern_code: PatternCode::Davis(2),
            pattern_description: None,
            score: 11.0,
            discovered_at: at,
            selected_at: at,
        };
        let path = write_selection(&selection, &dir.path().join("drafts")).unwrap();
        assert!(path.ends_with("2025-06-03_selection.json"));
        assert_eq!(read_selection(&path).unwrap(), selection);
    }

    #[test]
    fn test_read_candidates_from_search_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        fs::write(
            &path,
            r#"[
                {"title": "Policy backfire study", "url": "https://x.com/1", "date": "2025-06-01T00:00:00Z", "body": "..."},
                {"text": "Why We Lie", "source_url": "https://y.com/2", "discovered_at": "2025-05-30T12:00:00+02:00"}
            ]"#,
        )
        .unwrap();
        let candidates = read_candidates(&path).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text(), "Policy backfire study");
        assert_eq!(candidates[1].source_url(), "https://y.com/2");
    }

    #[test]
    fn test_read_candidates_missing_file() {
        let err = read_candidates(Path::new("/nonexistent/candidates.json")).unwrap_err();
        assert!(matches!(err, Error::Input { .. }));
    }

    #[test]
    fn test_read_selection_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"headline\": 1}").unwrap();
        assert!(read_selection(&path).is_err());
    }
}
