//! Script catalog CLI
//!
//! # Usage
//!
//! ```bash
//! catalog search <QUERY> [--limit N] [--json] [--offline]
//! catalog refresh [--force]
//! catalog status
//! catalog watch [--interval-secs N]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/script-catalog/config.toml)
//! 3. `--config` file
//! 4. Environment variables (CATALOG_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use catalog_cli::{
    init_logging, load_settings, run_refresh, run_search, run_status, run_watch, Cli, Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(
        cli.config.as_deref(),
        cli.data_dir.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Refresh { force } => {
            run_refresh(settings, force).await?;
        }
        Commands::Search {
            query,
            limit,
            json,
            offline,
        } => {
            run_search(settings, &query, limit, json, offline).await?;
        }
        Commands::Status => {
            run_status(settings)?;
        }
        Commands::Watch { interval_secs } => {
            run_watch(settings, interval_secs).await?;
        }
    }

    Ok(())
}
