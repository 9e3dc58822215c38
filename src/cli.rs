//! Command-line interface definitions for the Un:Curve headline selector.
//!
//! The orchestrating script calls `select` before the article is written and
//! `commit` only after the newsletter has actually been published.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the headline selector.
///
/// # Examples
///
/// ```sh
/// # Pick this week's headline and archive the hand-off record
/// uncurve_headlines select --candidates scout.json --output-dir ./drafts
///
/// # After the webhook accepted the newsletter
/// uncurve_headlines commit --selection ./drafts/2025-06-03_selection.json
///
/// # Look at what went out recently
/// uncurve_headlines history --last 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, env = "UNCURVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// History file; overrides `history_path` from the config file
    #[arg(long, env = "UNCURVE_HISTORY", global = true)]
    pub history: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter, score and select one headline; never touches history
    Select {
        /// JSON array of candidates from the search stage
        #[arg(short = 'i', long)]
        candidates: PathBuf,

        /// Also archive the selection as `{date}_selection.json` here
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Reference time for recency (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Record a published selection in history
    Commit {
        /// Selection JSON written by `select`
        #[arg(short, long)]
        selection: PathBuf,

        /// Publication time (RFC 3339); defaults to now
        #[arg(long)]
        used_at: Option<DateTime<Utc>>,
    },

    /// Print recorded headlines
    History {
        /// Only show the most recent N entries
        #[arg(short, long)]
        last: Option<usize>,
    },
}
