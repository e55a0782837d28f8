//! CLI argument parsing for the catalog binary.

use clap::{Parser, Subcommand};

/// Script catalog
///
/// Searches a locally cached, integrity-checked copy of the community
/// script catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/script-catalog/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the data directory (cache database and key file)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh the cached catalog if its TTL has expired
    Refresh {
        /// Refresh even if the cache is still fresh
        #[arg(short, long)]
        force: bool,
    },

    /// Search the catalog, refreshing first when stale
    Search {
        /// Space-separated keywords; every one must match
        query: String,

        /// Maximum results (default from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Use cached entries only, never fetch
        #[arg(long)]
        offline: bool,
    },

    /// Show cache freshness and key source
    Status,

    /// Keep the cache fresh until interrupted
    Watch {
        /// Seconds between freshness checks
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
}
