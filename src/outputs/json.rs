//! Daily snapshot files.
//!
//! Each category is written as a one-element JSON array into the day's
//! directory:
//! ```text
//! output_root/
//! └── 2024-03-14/
//!     ├── gainers.json   [{title, url, date, items: [...]}]
//!     └── themes.json    [{title, url, date, body}]
//! ```
//!
//! A snapshot with nothing in it is not written at all. A missing file means
//! "no data that day".

use crate::models::{GainerSnapshot, ThemeSnapshot};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Serialize `value` as pretty-printed UTF-8 JSON and write it to `path`.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    debug!(path = %path.display(), "Wrote JSON");
    Ok(())
}

/// Write `gainers.json` if the snapshot has items. Returns whether it wrote.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_gainers(
    dir: &Path,
    file_name: &str,
    snapshot: &GainerSnapshot,
) -> Result<bool, Box<dyn Error>> {
    if snapshot.items.is_empty() {
        info!("No gainer items; snapshot not written");
        return Ok(false);
    }
    let path = dir.join(file_name);
    write_json(&path, std::slice::from_ref(snapshot)).await?;
    info!(path = %path.display(), items = snapshot.items.len(), "Wrote gainers snapshot");
    Ok(true)
}

/// Write `themes.json` if the snapshot has a body. Returns whether it wrote.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn write_themes(
    dir: &Path,
    file_name: &str,
    snapshot: &ThemeSnapshot,
) -> Result<bool, Box<dyn Error>> {
    if snapshot.body.is_empty() {
        info!("Empty theme body; snapshot not written");
        return Ok(false);
    }
    let path = dir.join(file_name);
    write_json(&path, std::slice::from_ref(snapshot)).await?;
    info!(path = %path.display(), bytes = snapshot.body.len(), "Wrote themes snapshot");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GainerRecord;
    use crate::utils::testing::TempDir;

    fn gainers(items: Vec<GainerRecord>) -> GainerSnapshot {
        GainerSnapshot {
            title: "상한가/급등종목".into(),
            url: "https://stock.test/v/6".into(),
            date: "2024-03-14".into(),
            items,
        }
    }

    #[tokio::test]
    async fn test_gainers_written_as_array_without_escaping() {
        let dir = TempDir::new("json-gainers");
        let item = GainerRecord {
            name: "이름".into(),
            code: "123456".into(),
            reason: "실적개선".into(),
            ..Default::default()
        };

        assert!(write_gainers(dir.path(), "gainers.json", &gainers(vec![item])).await.unwrap());

        let raw = std::fs::read_to_string(dir.path().join("gainers.json")).unwrap();
        assert!(raw.contains("상한가/급등종목"));
        let parsed: Vec<GainerSnapshot> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].items[0].code, "123456");
    }

    #[tokio::test]
    async fn test_empty_snapshots_are_not_written() {
        let dir = TempDir::new("json-empty");
        assert!(!write_gainers(dir.path(), "gainers.json", &gainers(vec![])).await.unwrap());

        let themes = ThemeSnapshot {
            title: "특징 테마".into(),
            url: "https://stock.test/v/3".into(),
            date: "2024-03-14".into(),
            body: String::new(),
        };
        assert!(!write_themes(dir.path(), "themes.json", &themes).await.unwrap());

        assert!(!dir.path().join("gainers.json").exists());
        assert!(!dir.path().join("themes.json").exists());
    }
}
