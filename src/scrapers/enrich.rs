//! Per-ticker lookup of trading value, market cap and listed shares.
//!
//! Quote pages lay these out as label/value table rows, e.g.
//! `<tr><th>시가총액</th><td>4,215억원</td></tr>`, so values are found by
//! label rather than by position. Tickers are looked up one at a time and
//! each quote page is closed before the next is opened.

use crate::browser::{Browser, Page, inner_text, query_within};
use crate::config::EnrichmentConfig;
use crate::loader::PageLoader;
use crate::models::GainerRecord;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const TRADING_VALUE: &str = "거래대금";
const MARKET_CAP: &str = "시가총액";
const LISTED_SHARES: &str = "상장주식수";

/// Values read from one quote page; empty when a label was not found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickerFields {
    pub trading_value: String,
    pub market_cap: String,
    pub listed_shares: String,
}

impl TickerFields {
    pub fn from_page(page: &Page) -> Self {
        Self {
            trading_value: lookup_label(page, TRADING_VALUE).unwrap_or_default(),
            market_cap: lookup_label(page, MARKET_CAP).unwrap_or_default(),
            listed_shares: lookup_label(page, LISTED_SHARES).unwrap_or_default(),
        }
    }
}

/// Value for `label` from the first table row mentioning it.
///
/// The value is the cell after the label cell, or the rest of the label cell
/// when the value is rendered inline.
pub fn lookup_label(page: &Page, label: &str) -> Option<String> {
    let rows = page.query_all("tr").ok()?;
    for row in rows {
        let cells: Vec<String> = query_within(&row, "th, td")
            .unwrap_or_default()
            .iter()
            .map(|c| inner_text(c).replace('\n', " "))
            .collect();

        let Some(i) = cells.iter().position(|c| c.contains(label)) else {
            continue;
        };
        if let Some(next) = cells.get(i + 1).filter(|v| !v.is_empty()) {
            return Some(next.clone());
        }
        let inline = cells[i].replacen(label, "", 1).trim().to_string();
        if !inline.is_empty() {
            return Some(inline);
        }
    }
    None
}

/// Fill the enrichment fields of every record, sequentially.
///
/// # Arguments
///
/// * `browser` - Opens one quote page per record
/// * `items` - Records to enrich, in order
/// * `config` - Quote page URL template
/// * `timeout` - Navigation timeout per quote page
///
/// # Returns
///
/// The same records in the same order. A failed lookup leaves the fields as
/// empty strings; the record is kept.
#[instrument(level = "info", skip_all, fields(count = items.len()))]
pub async fn enrich_gainers<L: PageLoader>(
    browser: &Browser<L>,
    items: Vec<GainerRecord>,
    config: &EnrichmentConfig,
    timeout: Duration,
) -> Vec<GainerRecord> {
    let enriched: Vec<GainerRecord> = stream::iter(items)
        .then(|mut item| async move {
            let url = config.url_for(&item.code);
            let fields = match browser.open(&url, timeout).await {
                Ok(page) => TickerFields::from_page(&page),
                Err(e) => {
                    warn!(code = %item.code, %url, error = %e, "Ticker lookup failed");
                    TickerFields::default()
                }
            };
            debug!(code = %item.code, ?fields, "Enriched gainer");
            item.trading_value = Some(fields.trading_value);
            item.market_cap = Some(fields.market_cap);
            item.listed_shares = Some(fields.listed_shares);
            item
        })
        .collect()
        .await;

    info!(count = enriched.len(), "Enriched gainers");
    enriched
}
