//! # Un:Curve headline selector
//!
//! Command-line front end for the orchestrating newsletter script.
//!
//! ## Usage
//!
//! ```sh
//! uncurve_headlines select -i scout.json -o ./drafts > selection.json
//! # ... write the article, deliver it to the webhook ...
//! uncurve_headlines commit -s selection.json
//! ```
//!
//! Logs go to stderr; stdout carries only JSON. Failures exit with
//! 2 (corrupt history), 3 (no candidates), 4 (history write failed) or 1.

use chrono::Utc;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use uncurve_headlines::cli::{Cli, Command};
use uncurve_headlines::config::AppConfig;
use uncurve_headlines::handoff::{read_candidates, read_selection, write_selection};
use uncurve_headlines::selector::rank;
use uncurve_headlines::utils::truncate_for_log;
use uncurve_headlines::{Error, HistoryStore, Result, Run, Scorer};

fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let outcome = run(args, &mut io::stdout().lock());
    let elapsed = start_time.elapsed();
    match outcome {
        Ok(()) => {
            info!(millis = elapsed.as_millis() as u64, "Execution complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(event_kind = e.kind(), error = %e, "Execution failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Execute one subcommand, writing its JSON result to `out`.
fn run(args: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(history) = args.history {
        config.history_path = history;
    }

    match args.command {
        Command::Select {
            candidates,
            output_dir,
            now,
        } => {
            let now = now.unwrap_or_else(Utc::now);
            let candidates = read_candidates(&candidates)?;
            select(&config, candidates, output_dir.as_deref(), now, out)
        }
        Command::Commit { selection, used_at } => {
            let selection = read_selection(&selection)?;
            let mut history = HistoryStore::load(&config.history_path)?;
            let entry = selection.to_history_entry(used_at.unwrap_or_else(Utc::now));
            if let Err(e) = history.commit(entry) {
                // The newsletter already went out; the next run may repeat it.
                error!(
                    event_kind = e.kind(),
                    headline = %selection.headline,
                    "Published headline NOT recorded; fix history before the next run"
                );
                return Err(e);
            }
            info!(headline = %selection.headline, entries = history.len(), "Recorded published headline");
            Ok(())
        }
        Command::History { last } => {
            let history = HistoryStore::load(&config.history_path)?;
            let entries = history.entries();
            let start = last.map_or(0, |n| entries.len().saturating_sub(n));
            print_json(out, &entries[start..])
        }
    }
}

#[instrument(level = "info", skip_all, fields(candidates = candidates.len(), %now))]
fn select(
    config: &AppConfig,
    candidates: Vec<uncurve_headlines::HeadlineCandidate>,
    output_dir: Option<&std::path::Path>,
    now: chrono::DateTime<Utc>,
    out: &mut impl Write,
) -> Result<()> {
    let history = HistoryStore::load(&config.history_path)?;
    let rubric = config.rubric()?;
    let scorer = Scorer::new(&rubric, now)
        .with_recency(config.recency())
        .with_source_diversity(
            history.recent_domains(config.recent_source_window),
            config.source_repeat_penalty,
        );

    let mut run = Run::collect(candidates);
    run.filter(&history, config.filter_options(), config.max_candidates)?;
    for (i, s) in rank(run.score(&scorer)?).iter().enumerate() {
        debug!(
            rank = i + 1,
            score = s.score,
            pattern_code = %s.pattern_code,
            headline = %truncate_for_log(s.candidate.text(), 120),
            "Ranked candidate"
        );
    }
    run.select()?;

    let Some(selection) = run.selection(&scorer, now) else {
        return Err(Error::NoCandidates);
    };
    print_json(out, &selection)?;

    if let Some(dir) = output_dir {
        // Archive only; stdout already carries the hand-off.
        if let Err(e) = write_selection(&selection, dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to archive selection");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    let stdout_error = |reason: String| Error::Input {
        path: "<stdout>".into(),
        reason,
    };
    let json = serde_json::to_string_pretty(value).map_err(|e| stdout_error(e.to_string()))?;
    writeln!(out, "{json}").map_err(|e| stdout_error(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use uncurve_headlines::Selection;
    use uncurve_headlines::models::PatternCode;

    const CANDIDATES: &str = r#"[
        {"text": "Markets rose on Tuesday", "source_url": "https://a.com/1", "discovered_at": "2025-06-02T00:00:00Z"},
        {"text": "The Tipping Point Revisited", "source_url": "https://b.org/2", "discovered_at": "2025-06-01T00:00:00Z"}
    ]"#;

    fn cli(history: &Path, rest: &[&str]) -> Cli {
        let mut args = vec!["uncurve_headlines", "--history", history.to_str().unwrap()];
        args.extend_from_slice(rest);
        Cli::parse_from(args)
    }

    fn run_captured(args: Cli) -> (Result<()>, String) {
        let mut out = Vec::new();
        let outcome = run(args, &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_select_prints_selection_and_leaves_history_alone() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("history.jsonl");
        let input = dir.path().join("candidates.json");
        let drafts = dir.path().join("drafts");
        fs::write(&input, CANDIDATES).unwrap();

        let (outcome, stdout) = run_captured(cli(
            &history,
            &[
                "select",
                "-i",
                input.to_str().unwrap(),
                "-o",
                drafts.to_str().unwrap(),
                "--now",
                "2025-06-03T08:00:00Z",
            ],
        ));
        outcome.unwrap();

        let selection: Selection = serde_json::from_str(&stdout).unwrap();
        assert_eq!(selection.headline, "The Tipping Point Revisited");
        assert_eq!(selection.pattern_code, PatternCode::Davis(2));
        assert!(drafts.join("2025-06-03_selection.json").is_file());
        assert!(!history.exists());
    }

    #[test]
    fn test_commit_then_history_lists_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("history.jsonl");
        let input = dir.path().join("candidates.json");
        let selection_path = dir.path().join("selection.json");
        fs::write(&input, CANDIDATES).unwrap();

        let (outcome, stdout) = run_captured(cli(
            &history,
            &["select", "-i", input.to_str().unwrap(), "--now", "2025-06-03T08:00:00Z"],
        ));
        outcome.unwrap();
        fs::write(&selection_path, stdout).unwrap();

        let (outcome, stdout) = run_captured(cli(
            &history,
            &[
                "commit",
                "-s",
                selection_path.to_str().unwrap(),
                "--used-at",
                "2025-06-04T10:00:00Z",
            ],
        ));
        outcome.unwrap();
        assert!(stdout.is_empty());
        assert_eq!(HistoryStore::load(&history).unwrap().len(), 1);

        let (outcome, stdout) = run_captured(cli(&history, &["history", "-l", "5"]));
        outcome.unwrap();
        let listed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        // Committing the same selection again must not add a second entry.
        let (outcome, _) = run_captured(cli(
            &history,
            &["commit", "-s", selection_path.to_str().unwrap()],
        ));
        assert!(matches!(outcome, Err(Error::DuplicateEntry { .. })));
        assert_eq!(HistoryStore::load(&history).unwrap().len(), 1);
    }

    #[test]
    fn test_failures_map_to_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("history.jsonl");
        let input = dir.path().join("candidates.json");

        fs::write(&input, "[]").unwrap();
        let (outcome, stdout) = run_captured(cli(&history, &["select", "-i", input.to_str().unwrap()]));
        assert_eq!(outcome.unwrap_err().exit_code(), 3);
        assert!(stdout.is_empty());

        fs::write(&input, CANDIDATES).unwrap();
        fs::write(&history, "{not json\n").unwrap();
        let (outcome, stdout) = run_captured(cli(&history, &["select", "-i", input.to_str().unwrap()]));
        assert_eq!(outcome.unwrap_err().exit_code(), 2);
        assert!(stdout.is_empty());
        assert_eq!(fs::read_to_string(&history).unwrap(), "{not json\n");

        let missing = dir.path().join("missing.json");
        let (outcome, _) = run_captured(cli(&history, &["select", "-i", missing.to_str().unwrap()]));
        assert_eq!(outcome.unwrap_err().exit_code(), 1);
    }
}
