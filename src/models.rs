//! Data models for bulletin articles and the records extracted from them.
//!
//! This module defines the structures that flow through the job:
//! - [`ArticleRef`]: A located bulletin article, consumed once by an extractor
//! - [`GainerRecord`]: One limit-up / surging stock row
//! - [`GainerSnapshot`] and [`ThemeSnapshot`]: The per-day JSON documents
//! - [`LedgerEntry`]: A dated gainer row in the cumulative `master.json`
//! - [`DateIndex`]: The `index.json` manifest read by the web frontend
//!
//! Field names serialize in camelCase because the frontend reads them that way.

use serde::{Deserialize, Serialize};

/// Title used for the gainers snapshot document.
pub const GAINERS_TITLE: &str = "상한가/급등종목";

/// Title used for the themes snapshot document.
pub const THEMES_TITLE: &str = "특징 테마";

/// A bulletin article accepted by the locator.
///
/// Not persisted; the extractors only read its URL and the snapshot carries
/// the run date rather than `date_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    /// Cleaned anchor text (bulletin numbering suffix removed).
    pub title: String,
    /// Absolute URL of the detail page.
    pub url: String,
    /// Date text exactly as displayed on the detail page (may be empty).
    pub date_text: String,
}

/// A single stock row from the gainers article.
///
/// Only rows with a non-empty `name`, `code` and `reason` are ever emitted.
/// The enrichment fields are `None` when enrichment is disabled and an empty
/// string when a lookup ran but found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GainerRecord {
    pub name: String,
    /// 4-6 digit ticker code.
    pub code: String,
    pub price: String,
    pub change: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trading_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_shares: Option<String>,
}

impl GainerRecord {
    /// Whether this row carries enough to be emitted.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.code.is_empty() && !self.reason.is_empty()
    }
}

/// Body of `gainers.json` (written as a one-element array).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GainerSnapshot {
    pub title: String,
    pub url: String,
    pub date: String,
    pub items: Vec<GainerRecord>,
}

/// Body of `themes.json` (written as a one-element array).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeSnapshot {
    pub title: String,
    pub url: String,
    pub date: String,
    /// Text blocks joined with `\n`.
    pub body: String,
}

/// One row of the cumulative ledger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerEntry {
    pub date: String,
    #[serde(flatten)]
    pub record: GainerRecord,
}

/// Contents of `index.json`.
///
/// The shape depends on the configured [`IndexMode`](crate::config::IndexMode).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DateIndex {
    Latest {
        #[serde(rename = "latestDate")]
        latest_date: String,
    },
    Window {
        dates: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GainerRecord {
        GainerRecord {
            name: "이름".into(),
            code: "123456".into(),
            price: "1,000".into(),
            change: "+5%".into(),
            reason: "실적개선".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_complete_requires_name_code_reason() {
        assert!(record().is_complete());

        let mut r = record();
        r.reason.clear();
        assert!(!r.is_complete());

        let mut r = record();
        r.code.clear();
        assert!(!r.is_complete());

        let mut r = record();
        r.price.clear();
        r.change.clear();
        assert!(r.is_complete());
    }

    #[test]
    fn test_unenriched_record_omits_enrichment_fields() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(!json.contains("tradingValue"));
        assert!(!json.contains("marketCap"));
        assert!(json.contains("\"reason\":\"실적개선\""));
    }

    #[test]
    fn test_enriched_record_uses_camel_case() {
        let mut r = record();
        r.trading_value = Some("1,234".into());
        r.market_cap = Some(String::new());
        r.listed_shares = Some("5,000,000".into());
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"tradingValue\":\"1,234\""));
        assert!(json.contains("\"marketCap\":\"\""));
        assert!(json.contains("\"listedShares\":\"5,000,000\""));
    }

    #[test]
    fn test_ledger_entry_is_flat() {
        let entry = LedgerEntry {
            date: "2024-03-14".into(),
            record: record(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["date"], "2024-03-14");
        assert_eq!(value["code"], "123456");
        assert!(value.get("record").is_none());
    }

    #[test]
    fn test_date_index_shapes() {
        let latest = DateIndex::Latest {
            latest_date: "2024-03-14".into(),
        };
        assert_eq!(
            serde_json::to_string(&latest).unwrap(),
            r#"{"latestDate":"2024-03-14"}"#
        );

        let window = DateIndex::Window {
            dates: vec!["2024-03-14".into(), "2024-03-13".into()],
        };
        assert_eq!(
            serde_json::to_string(&window).unwrap(),
            r#"{"dates":["2024-03-14","2024-03-13"]}"#
        );
    }
}
