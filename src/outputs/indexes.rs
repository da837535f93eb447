//! Date directory management: the date index, retention and the
//! no-bulletin fallback.
//!
//! # Index Files
//!
//! - **`index.json`**: `{"latestDate": ...}` or `{"dates": [...]}` (newest
//!   first), always recomputed from the `YYYY-MM-DD` directories on disk
//!
//! # Retention
//!
//! With a retention window of W, only the W most recent date directories
//! are kept. Older ones are emptied and removed on a best-effort basis.
//!
//! # Weekends and holidays
//!
//! When neither article was found, the most recent earlier weekday's snapshot
//! files are copied verbatim into today's directory so the index still points
//! at a useful "latest" snapshot.

use crate::config::{FileNames, IndexMode};
use crate::models::DateIndex;
use crate::outputs::json::write_json;
use crate::utils::is_weekday;
use chrono::{Days, NaiveDate};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

static DATE_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// How far back the fallback looks for a weekday snapshot.
const FALLBACK_LOOKBACK_DAYS: u64 = 7;

/// Dates of all `YYYY-MM-DD` directories under `root`, oldest first.
pub async fn list_date_dirs(root: &Path) -> Result<Vec<NaiveDate>, Box<dyn Error>> {
    let mut dates = Vec::new();
    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !DATE_DIR.is_match(name) {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(name, "%Y-%m-%d") {
            dates.push(date);
        }
    }
    Ok(dates.into_iter().sorted().dedup().collect())
}

/// Empty and remove one date directory. Failures are logged, not returned.
/// Returns whether the directory is gone.
async fn remove_date_dir(dir: &Path) -> bool {
    match fs::read_dir(dir).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    warn!(path = %entry.path().display(), error = %e, "Could not remove file");
                }
            }
        }
        Err(e) => warn!(path = %dir.display(), error = %e, "Could not list directory"),
    }
    match fs::remove_dir(dir).await {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Could not remove directory");
            false
        }
    }
}

/// Delete all but the `keep` most recent date directories.
///
/// Removal is best effort: a directory that cannot be emptied or removed is
/// logged and left in place.
///
/// # Arguments
///
/// * `root` - The output root holding the `YYYY-MM-DD` directories
/// * `keep` - How many of the most recent date directories to keep
///
/// # Returns
///
/// The dates whose directories were actually removed, oldest first.
#[instrument(level = "info", skip(root), fields(root = %root.display()))]
pub async fn apply_retention(root: &Path, keep: usize) -> Result<Vec<NaiveDate>, Box<dyn Error>> {
    let dates = list_date_dirs(root).await?;
    if dates.len() <= keep {
        return Ok(Vec::new());
    }

    let expired = &dates[..dates.len() - keep];
    let mut removed = Vec::with_capacity(expired.len());
    for date in expired {
        if remove_date_dir(&root.join(date.format("%Y-%m-%d").to_string())).await {
            removed.push(*date);
        }
    }
    info!(
        removed = removed.len(),
        failed = expired.len() - removed.len(),
        kept = keep,
        "Applied retention"
    );
    Ok(removed)
}

/// Recompute the date index from disk.
///
/// An empty output root reports `today`.
pub async fn build_index(
    root: &Path,
    mode: IndexMode,
    window: Option<usize>,
    today: NaiveDate,
) -> Result<DateIndex, Box<dyn Error>> {
    let dates = list_date_dirs(root).await?;
    let fmt = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();

    Ok(match mode {
        IndexMode::Latest => DateIndex::Latest {
            latest_date: dates.last().map(fmt).unwrap_or_else(|| fmt(&today)),
        },
        IndexMode::Window => {
            let mut newest_first: Vec<String> = dates
                .iter()
                .rev()
                .take(window.unwrap_or(usize::MAX))
                .map(fmt)
                .collect();
            if newest_first.is_empty() {
                newest_first.push(fmt(&today));
            }
            DateIndex::Window {
                dates: newest_first,
            }
        }
    })
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_index(path: &Path, index: &DateIndex) -> Result<(), Box<dyn Error>> {
    write_json(path, index).await?;
    info!(?index, "Updated date index");
    Ok(())
}

/// Copy the most recent earlier weekday's snapshot files into `today`'s
/// directory.
///
/// Looks back up to seven calendar days, skipping Saturdays, Sundays and
/// directories holding neither snapshot file. Only the files that exist are
/// copied, byte for byte.
///
/// # Arguments
///
/// * `root` - The output root holding the `YYYY-MM-DD` directories
/// * `today` - The run date; its directory must already exist
/// * `files` - Snapshot file names to look for and copy
///
/// # Returns
///
/// The date copied from, or `None` when no earlier weekday had snapshots.
#[instrument(level = "info", skip(root, files), fields(root = %root.display()))]
pub async fn weekend_fallback(
    root: &Path,
    today: NaiveDate,
    files: &FileNames,
) -> Result<Option<NaiveDate>, Box<dyn Error>> {
    let today_dir = root.join(today.format("%Y-%m-%d").to_string());

    for back in 1..=FALLBACK_LOOKBACK_DAYS {
        let Some(day) = today.checked_sub_days(Days::new(back)) else {
            break;
        };
        if !is_weekday(day) {
            continue;
        }
        let source = root.join(day.format("%Y-%m-%d").to_string());
        if !fs::try_exists(&source).await? {
            continue;
        }

        let mut copied = 0;
        for name in [&files.gainers, &files.themes] {
            let from = source.join(name);
            if fs::try_exists(&from).await? {
                fs::copy(&from, today_dir.join(name)).await?;
                copied += 1;
            }
        }
        if copied > 0 {
            info!(from = %day, copied, "Copied previous weekday snapshot");
            return Ok(Some(day));
        }
        debug!(%day, "Weekday directory has no snapshots; looking further back");
    }

    info!("No earlier weekday snapshot to fall back on");
    Ok(None)
}
