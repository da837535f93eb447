//! Accumulating daily results on disk.
//!
//! # Submodules
//!
//! - [`json`]: Per-day snapshot files (`gainers.json`, `themes.json`)
//! - [`ledger`]: The cumulative `master.json` gainer ledger
//! - [`indexes`]: `index.json`, retention and the weekday fallback
//!
//! # Output Structure
//!
//! ```text
//! output_root/
//! ├── 2024-03-13/
//! │   ├── gainers.json
//! │   └── themes.json
//! ├── 2024-03-14/
//! │   └── themes.json
//! ├── master.json
//! └── index.json
//! ```

pub mod indexes;
pub mod json;
pub mod ledger;

use crate::config::Config;
use crate::models::{DateIndex, GainerSnapshot, ThemeSnapshot};
use chrono::NaiveDate;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// What one [`commit`] changed on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub gainers_written: bool,
    pub themes_written: bool,
    pub ledger_appended: usize,
    /// Weekday whose snapshots were copied into today's directory.
    pub fallback_from: Option<NaiveDate>,
    /// Date directories removed by retention.
    pub removed: Vec<NaiveDate>,
    pub index: DateIndex,
}

/// Persist one run's results under `config.output_root`.
///
/// Today's directory is always created, even when nothing is written into it.
/// The ledger only grows when a gainers snapshot was written.
///
/// # Arguments
///
/// * `config` - Output root, file names, retention and index mode
/// * `today` - The run date; names the directory written into
/// * `gainers` - The gainers snapshot, or `None` if no article was found
/// * `themes` - The themes snapshot, or `None` if no article was found
///
/// # Returns
///
/// A [`CommitSummary`] of what changed on disk.
///
/// # Fallback
///
/// Only when both `gainers` and `themes` are `None` (and today's directory
/// holds neither snapshot file) are the previous weekday's files copied in.
/// A found article whose extraction came back empty does not trigger it.
///
/// # Errors
///
/// Returns an error if a directory or file cannot be written, or if the
/// existing ledger cannot be parsed.
#[instrument(level = "info", skip_all, fields(root = %config.output_root.display(), %today))]
pub async fn commit(
    config: &Config,
    today: NaiveDate,
    gainers: Option<&GainerSnapshot>,
    themes: Option<&ThemeSnapshot>,
) -> Result<CommitSummary, Box<dyn Error>> {
    let root = config.output_root.as_path();
    let dashed = today.format("%Y-%m-%d").to_string();
    let today_dir = root.join(&dashed);
    fs::create_dir_all(&today_dir).await?;

    let gainers_written = match gainers {
        Some(snapshot) => json::write_gainers(&today_dir, &config.files.gainers, snapshot).await?,
        None => false,
    };
    let themes_written = match themes {
        Some(snapshot) => json::write_themes(&today_dir, &config.files.themes, snapshot).await?,
        None => false,
    };

    let ledger_appended = match gainers {
        Some(snapshot) if gainers_written => {
            ledger::append_to_ledger(&root.join(&config.files.ledger), &dashed, &snapshot.items)
                .await?
        }
        _ => 0,
    };

    // Only when neither article was found at all.
    let fallback_from = if gainers.is_none()
        && themes.is_none()
        && !fs::try_exists(today_dir.join(&config.files.gainers)).await?
        && !fs::try_exists(today_dir.join(&config.files.themes)).await?
    {
        indexes::weekend_fallback(root, today, &config.files).await?
    } else {
        None
    };

    let removed = match config.retention_days {
        Some(keep) => indexes::apply_retention(root, keep).await?,
        None => Vec::new(),
    };

    let index =
        indexes::build_index(root, config.index_mode, config.retention_days, today).await?;
    indexes::write_index(&root.join(&config.files.index), &index).await?;

    let summary = CommitSummary {
        gainers_written,
        themes_written,
        ledger_appended,
        fallback_from,
        removed,
        index,
    };
    info!(?summary, "Committed run");
    Ok(summary)
}
