//! # Daily Stock Brief
//!
//! A once-a-day collector for the infostock market bulletin. It finds today's
//! "limit-up / surging stocks" and "featured themes" articles on the bulletin
//! listing, extracts their content, and accumulates the results as dated JSON
//! files for a static web frontend.
//!
//! ## Usage
//!
//! ```sh
//! daily_stockbrief -o ../daily-stockbrief-web/public/data
//! ```
//!
//! ## Architecture
//!
//! Each run is sequential:
//! 1. **Discovery**: Page through the listing for a title-filtered candidate
//!    dated today
//! 2. **Extraction**: Pull gainer rows or the theme text from the article
//! 3. **Accumulation**: Write the day's snapshots, extend `master.json`,
//!    apply retention and refresh `index.json`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod loader;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use browser::Browser;
use cli::Cli;
use config::Config;
use loader::http_loader;
use scrapers::dates::Today;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("daily_stockbrief starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_cli(&args);
    info!(
        base_url = %config.base_url,
        output_root = %config.output_root.display(),
        max_pages = config.max_pages,
        retention_days = ?config.retention_days,
        "Effective configuration"
    );

    if let Err(e) = ensure_writable_dir(&config.output_root).await {
        error!(
            path = %config.output_root.display(),
            error = %e,
            "Output root is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let today = Today::new(args.date.unwrap_or_else(|| Local::now().date_naive()));
    let browser = Browser::new(http_loader(&config.http)?);

    let summary = pipeline::run(&config, &browser, &today).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        gainers = summary.gainers_written,
        themes = summary.themes_written,
        ledger_appended = summary.ledger_appended,
        fallback_from = ?summary.fallback_from,
        "Execution complete"
    );

    Ok(())
}
