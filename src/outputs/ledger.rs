//! The cumulative gainers ledger (`master.json`).
//!
//! A flat JSON array of dated gainer rows, appended to on every run that
//! found gainers. The file is read in full, extended and rewritten; there is
//! no deduplication, so running twice for the same day records that day
//! twice.

use crate::models::{GainerRecord, LedgerEntry};
use crate::outputs::json::write_json;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Read the ledger, or an empty one if the file does not exist yet.
///
/// An existing but unreadable ledger is an error; silently starting over
/// would drop its history on the next write.
pub async fn load_ledger(path: &Path) -> Result<Vec<LedgerEntry>, Box<dyn Error>> {
    if !fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("ledger {} is not a valid entry array: {e}", path.display()).into())
}

/// Append `items` tagged with `date` and rewrite the ledger.
///
/// # Arguments
///
/// * `path` - Location of `master.json`
/// * `date` - `YYYY-MM-DD` tag for every appended entry
/// * `items` - Records to append, in order
///
/// # Returns
///
/// The number of entries appended.
///
/// # Errors
///
/// Fails without writing if the existing ledger cannot be read or parsed.
#[instrument(level = "info", skip_all, fields(path = %path.display(), %date))]
pub async fn append_to_ledger(
    path: &Path,
    date: &str,
    items: &[GainerRecord],
) -> Result<usize, Box<dyn Error>> {
    let mut ledger = load_ledger(path).await?;

    let existing = ledger.iter().filter(|e| e.date == date).count();
    if existing > 0 {
        warn!(existing, "Ledger already has entries for this date; appending again");
    }

    ledger.extend(items.iter().map(|record| LedgerEntry {
        date: date.to_string(),
        record: record.clone(),
    }));
    write_json(path, &ledger).await?;

    info!(appended = items.len(), total = ledger.len(), "Updated ledger");
    Ok(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::TempDir;

    fn record(code: &str) -> GainerRecord {
        GainerRecord {
            name: "이름".into(),
            code: code.into(),
            price: "1,000".into(),
            change: "+5%".into(),
            reason: "실적개선".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_append_creates_then_extends() {
        let dir = TempDir::new("ledger-append");
        let path = dir.path().join("master.json");

        append_to_ledger(&path, "2024-03-13", &[record("111111")]).await.unwrap();
        append_to_ledger(&path, "2024-03-14", &[record("222222"), record("333333")])
            .await
            .unwrap();

        let ledger = load_ledger(&path).await.unwrap();
        let keys: Vec<(&str, &str)> = ledger
            .iter()
            .map(|e| (e.date.as_str(), e.record.code.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2024-03-13", "111111"),
                ("2024-03-14", "222222"),
                ("2024-03-14", "333333")
            ]
        );
    }

    #[tokio::test]
    async fn test_same_day_is_appended_twice() {
        let dir = TempDir::new("ledger-twice");
        let path = dir.path().join("master.json");

        append_to_ledger(&path, "2024-03-14", &[record("123456")]).await.unwrap();
        append_to_ledger(&path, "2024-03-14", &[record("123456")]).await.unwrap();

        let ledger = load_ledger(&path).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0], ledger[1]);
    }

    #[tokio::test]
    async fn test_reads_legacy_entries_without_enrichment() {
        let dir = TempDir::new("ledger-legacy");
        let path = dir.path().join("master.json");
        std::fs::write(
            &path,
            r#"[{"date":"2024-03-13","name":"A","code":"000001","price":"","change":"","reason":"r"}]"#,
        )
        .unwrap();

        let ledger = load_ledger(&path).await.unwrap();
        assert_eq!(ledger[0].record.code, "000001");
        assert_eq!(ledger[0].record.market_cap, None);
    }

    #[tokio::test]
    async fn test_garbled_ledger_fails_loudly() {
        let dir = TempDir::new("ledger-garbled");
        let path = dir.path().join("master.json");
        std::fs::write(&path, r#"[{"date":"2024-03-13","name":"#).unwrap();

        assert!(append_to_ledger(&path, "2024-03-14", &[record("123456")]).await.is_err());
        // The damaged file is left as it was.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"[{"date":"2024-03-13","name":"#);
    }
}
