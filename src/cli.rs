use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::fetch::DEFAULT_BASE_URL;
use crate::model::EPOCH_YEAR;

#[derive(Parser, Debug)]
#[command(name = "sumo-history-import")]
#[command(version, about = "Import historical sumo tournaments, banzuke and bouts into SQLite")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and import tournaments, then recompute tournament records
    Import {
        /// SQLite database path (created if missing)
        db: PathBuf,

        /// First year to import (earliest is 1958)
        #[arg(long, default_value_t = EPOCH_YEAR)]
        from_year: i32,

        /// Tournaments fetched concurrently
        #[arg(short, long, default_value_t = 4)]
        workers: usize,

        /// Base URL of the sumo API
        #[arg(long, env = "SUMO_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// Attempts per request, including the first
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Cache settled API responses on disk
        #[arg(long)]
        cache: bool,

        /// Custom cache directory (implies --cache)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Ignore cached responses (they are still refreshed)
        #[arg(short, long)]
        force: bool,

        /// Only import these units (comma-separated, as printed for skipped units)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,

        /// Skip the wrestler roster
        #[arg(long)]
        no_roster: bool,

        /// Skip recomputing tournament records
        #[arg(long)]
        no_stats: bool,

        /// Show the full-screen progress UI
        #[arg(long)]
        tui: bool,
    },

    /// Recompute tournament records from the bouts already stored
    Aggregate {
        /// SQLite database path
        db: PathBuf,
    },

    /// List the tournaments an import would cover
    ListTournaments {
        #[arg(long, default_value_t = EPOCH_YEAR)]
        from_year: i32,
    },

    /// Delete cached API responses
    ClearCache {
        /// Custom cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
