//! Persisted ledger of headlines that already went out.
//!
//! The store is a JSON Lines file: one [`HistoryEntry`] per line, so an
//! operator can read or hand-edit it between runs. It is loaded once at run
//! start and written once, at the very end of a successful run, by
//! [`HistoryStore::commit`].
//!
//! # Crash safety
//!
//! `commit` serializes the full updated sequence to `.<file>.tmp` next to the
//! store, syncs it, then renames it over the store. A crash or I/O failure at
//! any point before the rename leaves the previous file untouched.
//!
//! There is no locking. Two concurrent runs against one store are not
//! supported.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::HistoryEntry;
use crate::utils::{ensure_parent_dir, normalize_headline, source_domain};

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
    normalized: HashSet<String>,
}

impl HistoryStore {
    /// Load the store at `path`.
    ///
    /// A missing file is an empty history (first run). Any line that fails to
    /// parse, or that repeats an earlier headline, fails the load with
    /// [`Error::StorageCorrupt`].
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No history file yet; starting empty");
                return Ok(Self {
                    path,
                    entries: Vec::new(),
                    normalized: HashSet::new(),
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to read history file");
                return Err(Error::StorageCorrupt {
                    path,
                    line: 0,
                    reason: e.to_string(),
                });
            }
        };

        let mut entries = Vec::new();
        let mut normalized = HashSet::new();
        for (idx, line) in raw.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            let mut entry: HistoryEntry =
                serde_json::from_str(line).map_err(|e| Error::StorageCorrupt {
                    path: path.clone(),
                    line: line_no,
                    reason: e.to_string(),
                })?;
            // Hand edits may not keep the stored form normalized.
            entry.normalized_text = normalize_headline(&entry.normalized_text);
            if entry.normalized_text.is_empty() {
                return Err(Error::StorageCorrupt {
                    path,
                    line: line_no,
                    reason: "empty normalized_text".to_string(),
                });
            }
            if !normalized.insert(entry.normalized_text.clone()) {
                return Err(Error::StorageCorrupt {
                    path,
                    line: line_no,
                    reason: format!("duplicate headline {:?}", entry.normalized_text),
                });
            }
            entries.push(entry);
        }

        info!(entries = entries.len(), "Loaded headline history");
        Ok(Self {
            path,
            entries,
            normalized,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in the order they were committed.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a headline with the same normalized text was already used.
    pub fn contains(&self, candidate_text: &str) -> bool {
        self.normalized.contains(&normalize_headline(candidate_text))
    }

    /// Whether a non-empty source URL was already used.
    pub fn contains_url(&self, source_url: &str) -> bool {
        !source_url.is_empty() && self.entries.iter().any(|e| e.source_url == source_url)
    }

    /// Source domains of the last `n` entries, oldest first, without repeats.
    pub fn recent_domains(&self, n: usize) -> Vec<String> {
        let start = self.entries.len().saturating_sub(n);
        let mut seen = HashSet::new();
        self.entries[start..]
            .iter()
            .filter_map(|e| source_domain(&e.source_url))
            .filter(|d| seen.insert(d.clone()))
            .collect()
    }

    /// Timestamp of the most recent commit, if any.
    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.entries.last().map(|e| e.used_at)
    }

    /// Append one entry and persist the whole sequence atomically.
    ///
    /// On failure the in-memory sequence and the file on disk both keep the
    /// pre-commit state.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), headline = %entry.normalized_text))]
    pub fn commit(&mut self, mut entry: HistoryEntry) -> Result<()> {
        entry.normalized_text = normalize_headline(&entry.normalized_text);
        // `load` rejects blank lines of this kind, so never write one.
        if entry.normalized_text.is_empty() {
            warn!("Refusing to record a blank headline");
            return Err(Error::EmptyHeadline);
        }
        if self.normalized.contains(&entry.normalized_text) {
            warn!("Refusing to record a headline twice");
            return Err(Error::DuplicateEntry {
                normalized_text: entry.normalized_text,
            });
        }

        let mut body = String::new();
        for existing in self.entries.iter().chain(std::iter::once(&entry)) {
            let line = serde_json::to_string(existing).map_err(|e| Error::StorageWrite {
                path: self.path.clone(),
                source: io::Error::other(e),
            })?;
            body.push_str(&line);
            body.push('\n');
        }

        if let Err(e) = write_atomically(&self.path, body.as_bytes()) {
            error!(error = %e, "History commit failed; store left at previous state");
            return Err(Error::StorageWrite {
                path: self.path.clone(),
                source: e,
            });
        }

        self.normalized.insert(entry.normalized_text.clone());
        self.entries.push(entry);
        info!(entries = self.entries.len(), "Committed headline to history");
        Ok(())
    }
}

/// Path of the scratch file used while committing `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "history".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_path_for(path);
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() && tmp.is_file() {
        let _ = fs::remove_file(&tmp);
    }
    debug!(tmp = %tmp.display(), ok = result.is_ok(), "Atomic write finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PatternCode;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn entry(title: &str, url: &str) -> HistoryEntry {
        HistoryEntry::new(title, url, at(2025, 1, 1), PatternCode::Davis(1))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(dir.path().join("history.jsonl")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_used_at(), None);
    }

    #[test]
    fn test_commit_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let mut store = HistoryStore::load(&path).unwrap();
        store.commit(entry("Why We Lie", "https://a.example.com/1")).unwrap();
        store.commit(entry("Second Story", "https://b.example.org/2")).unwrap();

        let reloaded = HistoryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.entries()[0].title, "Why We Lie");
        assert_eq!(reloaded.entries()[1].title, "Second Story");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_contains_is_case_and_whitespace_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path().join("h.jsonl")).unwrap();
        store.commit(entry("Headline X", "")).unwrap();
        assert!(store.contains("headline x"));
        assert!(store.contains("  HEADLINE    X "));
        assert!(!store.contains("headline y"));
    }

    #[test]
    fn test_contains_url_ignores_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path().join("h.jsonl")).unwrap();
        store.commit(entry("A", "")).unwrap();
        store.commit(entry("B", "https://x.com/b")).unwrap();
        assert!(!store.contains_url(""));
        assert!(store.contains_url("https://x.com/b"));
        assert!(!store.contains_url("https://x.com/c"));
    }

    #[test]
    fn test_commit_rejects_duplicate_headline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.jsonl");
        let mut store = HistoryStore::load(&path).unwrap();
        store.commit(entry("Why We Lie", "a")).unwrap();
        let err = store.commit(entry("why  we lie", "other")).unwrap_err();
        assert!(matches!(err, Error::DuplicateEntry { .. }));
        assert_eq!(HistoryStore::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_commit_rejects_blank_headline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.jsonl");
        let mut store = HistoryStore::load(&path).unwrap();
        store.commit(entry("Kept", "")).unwrap();

        let err = store.commit(entry("   ", "https://x.com/a")).unwrap_err();
        assert!(matches!(err, Error::EmptyHeadline));
        assert_eq!(store.len(), 1);

        let reloaded = HistoryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(!reloaded.contains_url("https://x.com/a"));
    }

    #[test]
    fn test_unparseable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.jsonl");
        let good = serde_json::to_string(&entry("Fine", "")).unwrap();
        fs::write(&path, format!("{good}\n{{not json\n")).unwrap();
        match HistoryStore::load(&path).unwrap_err() {
            Error::StorageCorrupt { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hand_edited_duplicate_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.jsonl");
        let a = serde_json::to_string(&entry("Same Story", "")).unwrap();
        let b = a.replace("same story", "SAME   story");
        fs::write(&path, format!("{a}\n\n{b}\n")).unwrap();
        match HistoryStore::load(&path).unwrap_err() {
            Error::StorageCorrupt { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("duplicate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interrupted_commit_leaves_history_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.jsonl");
        let mut store = HistoryStore::load(&path).unwrap();
        store.commit(entry("First", "")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // Occupy the scratch path so the write fails before the rename.
        fs::create_dir(temp_path_for(&path)).unwrap();
        let err = store.commit(entry("Second", "")).unwrap_err();
        assert!(matches!(err, Error::StorageWrite { .. }));
        assert_eq!(store.len(), 1);
        assert!(!store.contains("second"));

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        let reloaded = HistoryStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(!reloaded.contains("Second"));
    }

    #[test]
    fn test_recent_domains() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path().join("h.jsonl")).unwrap();
        store.commit(entry("One", "https://www.nature.com/1")).unwrap();
        store.commit(entry("Two", "https://www.wired.com/2")).unwrap();
        store.commit(entry("Three", "https://nature.com/3")).unwrap();
        store.commit(entry("Four", "")).unwrap();
        assert_eq!(store.recent_domains(3), vec!["wired", "nature"]);
        assert_eq!(store.recent_domains(1), Vec::<String>::new());
        assert_eq!(store.recent_domains(10), vec!["nature", "wired"]);
    }

    #[test]
    fn test_temp_path_sits_next_to_store() {
        let p = Path::new("/var/lib/uncurve/history.jsonl");
        assert_eq!(
            temp_path_for(p),
            PathBuf::from("/var/lib/uncurve/.history.jsonl.tmp")
        );
    }
}
