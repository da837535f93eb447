//! Row extraction from the limit-up / surging stocks article.
//!
//! Stock rows are the table rows holding an `a.popup` anchor; header and
//! spacer rows have none. The anchor renders as two lines, name then
//! `(123456)`. Price, change and reason come from the row's remaining cells
//! by position.

use crate::browser::{Page, inner_text, query_within};
use crate::models::GainerRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use tracing::{debug, info, instrument, warn};

static TICKER_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4,6})\)").unwrap());

const POPUP_ANCHOR: &str = "a.popup";
const CELL: &str = "td";

/// Name and ticker code from the popup anchor's rendered text.
///
/// The code is normally on the second line. Some rows render it inline
/// (`삼성전자 (005930)`), in which case it is cut out of the name.
pub fn split_name_code(raw: &str) -> (String, String) {
    let cleaned = raw.replace(['\r', '\t'], "");
    let lines: Vec<&str> = cleaned
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return (String::new(), String::new());
    };

    if let Some(second) = lines.get(1) {
        let code = TICKER_CODE
            .captures(second)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        return (first.to_string(), code);
    }

    match TICKER_CODE.captures(first) {
        Some(c) => {
            let name = first.replace(&c[0], "").trim().to_string();
            (name, c[1].to_string())
        }
        None => (first.to_string(), String::new()),
    }
}

/// Extract one row, or `None` when it is not a complete stock row.
fn extract_row(row: &ElementRef<'_>) -> Option<GainerRecord> {
    let anchor = match query_within(row, POPUP_ANCHOR) {
        Ok(anchors) => anchors.into_iter().next()?,
        Err(e) => {
            warn!(error = %e, "Row query failed; skipping row");
            return None;
        }
    };
    let (name, code) = split_name_code(&inner_text(&anchor));

    // The name cell, when the anchor sits in a td, is not a data column.
    let cells: Vec<String> = query_within(row, CELL)
        .unwrap_or_default()
        .into_iter()
        .filter(|td| query_within(td, POPUP_ANCHOR).map_or(true, |a| a.is_empty()))
        .map(|td| inner_text(&td))
        .collect();
    let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();

    let record = GainerRecord {
        name,
        code,
        price: cell(0),
        change: cell(1),
        reason: cell(2),
        ..Default::default()
    };

    if record.is_complete() {
        Some(record)
    } else {
        debug!(name = %record.name, code = %record.code, cells = cells.len(), "Dropping partial row");
        None
    }
}

/// All complete gainer rows on the article page, in document order.
///
/// # Arguments
///
/// * `page` - The loaded gainers article
///
/// # Returns
///
/// One record per table row with a popup anchor and a non-empty name, code
/// and reason. Other rows are dropped silently.
#[instrument(level = "info", skip_all, fields(url = %page.url()))]
pub fn extract_gainers(page: &Page) -> Vec<GainerRecord> {
    let rows = match page.query_all("tr") {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Could not enumerate table rows");
            return Vec::new();
        }
    };

    let items: Vec<GainerRecord> = rows.iter().filter_map(extract_row).collect();
    info!(rows = rows.len(), items = items.len(), "Extracted gainers");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{StaticLoader, browser};
    use std::time::Duration;

    const URL: &str = "https://stock.test/news/view/6";

    async fn extract(html: &str) -> Vec<GainerRecord> {
        let b = browser(StaticLoader::new().with_page(URL, html));
        let page = b.open(URL, Duration::from_secs(1)).await.unwrap();
        extract_gainers(&page)
    }

    #[test]
    fn test_split_name_code() {
        assert_eq!(
            split_name_code("이름\n(123456)"),
            ("이름".to_string(), "123456".to_string())
        );
        assert_eq!(
            split_name_code("\t삼성전자\r\n  코스피 (005930) \n"),
            ("삼성전자".to_string(), "005930".to_string())
        );
        assert_eq!(
            split_name_code("삼성전자 (005930)"),
            ("삼성전자".to_string(), "005930".to_string())
        );
        assert_eq!(
            split_name_code("이름\n(12)"),
            ("이름".to_string(), String::new())
        );
        assert_eq!(split_name_code(""), (String::new(), String::new()));
    }

    #[tokio::test]
    async fn test_single_qualifying_row() {
        let html = r##"
            <table>
              <tr><th>종목</th><th>가격</th><th>등락률</th><th>사유</th></tr>
              <tr>
                <th><a class="popup" href="#">이름<br>(123456)</a></th>
                <td>1,000</td><td>+5%</td><td>실적개선</td>
              </tr>
            </table>"##;

        let items = extract(html).await;
        assert_eq!(
            items,
            vec![GainerRecord {
                name: "이름".into(),
                code: "123456".into(),
                price: "1,000".into(),
                change: "+5%".into(),
                reason: "실적개선".into(),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn test_anchor_inside_td_is_not_a_data_column() {
        let html = r#"
            <table><tr>
              <td><a class="popup">에코프로<br>(086520)</a></td>
              <td>120,500</td><td>+29.98%</td><td>2차전지 수주</td>
            </tr></table>"#;

        let items = extract(html).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "086520");
        assert_eq!(items[0].price, "120,500");
        assert_eq!(items[0].reason, "2차전지 수주");
    }

    #[tokio::test]
    async fn test_partial_rows_are_dropped() {
        let html = r#"
            <table>
              <tr><td colspan="4">코스피</td></tr>
              <tr><th><a class="popup">코드없음<br>(없음)</a></th><td>1</td><td>2</td><td>사유</td></tr>
              <tr><th><a class="popup">사유없음<br>(111111)</a></th><td>1</td><td>2</td></tr>
              <tr><th><a class="popup">빈사유<br>(222222)</a></th><td>1</td><td>2</td><td> </td></tr>
              <tr><th><a class="popup">정상<br>(333333)</a></th><td></td><td></td><td>테마 편입</td></tr>
            </table>"#;

        let items = extract(html).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "정상");
        assert_eq!(items[0].price, "");
        assert_eq!(items[0].change, "");
        assert_eq!(items[0].reason, "테마 편입");
    }

    #[tokio::test]
    async fn test_no_table_yields_nothing() {
        assert!(extract("<p>휴장</p>").await.is_empty());
    }
}
