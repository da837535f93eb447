//! Command-line interface definitions for the daily stock brief job.
//!
//! The job always runs once and exits. Flags only override values from the
//! optional YAML configuration file; each flag can also come from the
//! environment.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a single collection run.
///
/// # Examples
///
/// ```sh
/// # Defaults (writes next to the web frontend)
/// daily_stockbrief
///
/// # Explicit config and output directory
/// daily_stockbrief -c stockbrief.yaml -o ./public/data
///
/// # Re-run for a specific day
/// daily_stockbrief --date 2024-03-14
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "STOCKBRIEF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output root holding the dated directories, master.json and index.json
    #[arg(short, long, env = "STOCKBRIEF_OUTPUT_ROOT")]
    pub output_root: Option<PathBuf>,

    /// Listing page the bulletin articles are searched on
    #[arg(long, env = "STOCKBRIEF_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum number of listing pages to scan per category
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Number of most recent date directories to keep
    #[arg(long)]
    pub retention_days: Option<usize>,

    /// Treat this date (YYYY-MM-DD) as today instead of the local date
    #[arg(long)]
    pub date: Option<NaiveDate>,
}
