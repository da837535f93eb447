//! One end-to-end collection run.

use crate::browser::Browser;
use crate::config::Config;
use crate::loader::PageLoader;
use crate::outputs::{self, CommitSummary};
use crate::scrapers::{self, dates::Today};
use std::error::Error;
use tracing::{info, instrument, warn};

/// Scrape both categories for `today`, one after the other, and commit the
/// results to the output root.
///
/// # Arguments
///
/// * `config` - The effective configuration
/// * `browser` - Opens every page the run needs
/// * `today` - The run date
///
/// # Returns
///
/// The [`CommitSummary`] of what was written.
///
/// # Errors
///
/// Scraping never fails the run; only output I/O and an unreadable ledger do.
#[instrument(level = "info", skip_all, fields(date = %today.dashed()))]
pub async fn run<L: PageLoader>(
    config: &Config,
    browser: &Browser<L>,
    today: &Today,
) -> Result<CommitSummary, Box<dyn Error>> {
    let gainers = scrapers::scrape_gainers(browser, config, today).await;
    let themes = scrapers::scrape_themes(browser, config, today).await;

    if browser.live_pages() > 0 {
        warn!(live = browser.live_pages(), "Pages still open after scraping");
    }
    info!(
        gainers = gainers.as_ref().map_or(0, |g| g.items.len()),
        themes = themes.is_some(),
        "Scraping finished"
    );

    outputs::commit(config, today.date(), gainers.as_ref(), themes.as_ref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{StaticLoader, browser};
    use crate::models::{DateIndex, GainerSnapshot, LedgerEntry, ThemeSnapshot};
    use crate::utils::testing::TempDir;
    use chrono::NaiveDate;

    const LIST: &str = "https://stock.test/news/media/infostock";
    const GAINERS_URL: &str = "https://stock.test/news/view/6";
    const THEMES_URL: &str = "https://stock.test/news/view/3";

    fn listing() -> String {
        format!(
            r#"<html><body><ul>
                 <li><a href="{GAINERS_URL}">3월 14일 상한가 (증시요약(6))</a></li>
                 <li><a href="{THEMES_URL}">3월 14일 특징 테마 (증시요약(3))</a></li>
               </ul></body></html>"#
        )
    }

    const GAINERS_PAGE: &str = r##"
        <html><body>
          <span class="date">2024-03-14 16:40</span>
          <table>
            <tr><th><a class="popup" href="#">이름<br>(123456)</a></th>
                <td>1,000</td><td>+5%</td><td>실적개선</td></tr>
          </table>
        </body></html>"##;

    const THEMES_PAGE: &str = r#"
        <html><body>
          <span class="date">2024.03.14</span>
          <table><tr><td style="text-align:left">반도체: 수요 회복</td></tr>
                 <tr><td style="text-align:left">2차전지: 수주 확대</td></tr></table>
        </body></html>"#;

    fn site() -> StaticLoader {
        StaticLoader::new()
            .with_page(LIST, &listing())
            .with_page(GAINERS_URL, GAINERS_PAGE)
            .with_page(THEMES_URL, THEMES_PAGE)
    }

    fn config(root: &std::path::Path) -> Config {
        Config {
            base_url: LIST.to_string(),
            output_root: root.to_path_buf(),
            ..Default::default()
        }
    }

    fn read<T: serde::de::DeserializeOwned>(path: std::path::PathBuf) -> T {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_full_run_writes_snapshots_ledger_and_index() {
        let dir = TempDir::new("pipeline-full");
        let b = browser(site());
        let today = Today::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());

        let summary = run(&config(dir.path()), &b, &today).await.unwrap();
        assert!(summary.gainers_written && summary.themes_written);
        assert_eq!(b.live_pages(), 0);

        let gainers: Vec<GainerSnapshot> = read(dir.path().join("2024-03-14/gainers.json"));
        assert_eq!(gainers[0].title, "상한가/급등종목");
        assert_eq!(gainers[0].url, GAINERS_URL);
        assert_eq!(gainers[0].date, "2024-03-14");
        assert_eq!(gainers[0].items[0].name, "이름");
        assert_eq!(gainers[0].items[0].code, "123456");

        let themes: Vec<ThemeSnapshot> = read(dir.path().join("2024-03-14/themes.json"));
        assert_eq!(themes[0].title, "특징 테마");
        assert_eq!(themes[0].body, "반도체: 수요 회복\n2차전지: 수주 확대");

        let ledger: Vec<LedgerEntry> = read(dir.path().join("master.json"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].date, "2024-03-14");

        let index: DateIndex = read(dir.path().join("index.json"));
        assert_eq!(
            index,
            DateIndex::Latest {
                latest_date: "2024-03-14".into()
            }
        );
    }

    #[tokio::test]
    async fn test_rerun_same_day_duplicates_ledger_only() {
        let dir = TempDir::new("pipeline-rerun");
        let today = Today::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());

        run(&config(dir.path()), &browser(site()), &today).await.unwrap();
        let first = std::fs::read(dir.path().join("2024-03-14/gainers.json")).unwrap();
        run(&config(dir.path()), &browser(site()), &today).await.unwrap();
        let second = std::fs::read(dir.path().join("2024-03-14/gainers.json")).unwrap();

        assert_eq!(first, second);
        let ledger: Vec<LedgerEntry> = read(dir.path().join("master.json"));
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_weekend_run_falls_back_to_last_bulletin() {
        let dir = TempDir::new("pipeline-weekend");
        let thursday = Today::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        run(&config(dir.path()), &browser(site()), &thursday).await.unwrap();

        // Saturday: the listing still only shows Thursday's bulletins.
        let saturday = Today::new(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        let summary = run(&config(dir.path()), &browser(site()), &saturday)
            .await
            .unwrap();

        assert!(!summary.gainers_written && !summary.themes_written);
        assert_eq!(summary.fallback_from, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(
            std::fs::read(dir.path().join("2024-03-16/gainers.json")).unwrap(),
            std::fs::read(dir.path().join("2024-03-14/gainers.json")).unwrap()
        );
        let ledger: Vec<LedgerEntry> = read(dir.path().join("master.json"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            summary.index,
            DateIndex::Latest {
                latest_date: "2024-03-16".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_site_still_commits() {
        let dir = TempDir::new("pipeline-down");
        let today = Today::new(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());

        let summary = run(&config(dir.path()), &browser(StaticLoader::new()), &today)
            .await
            .unwrap();

        assert!(!summary.gainers_written);
        assert_eq!(summary.fallback_from, None);
        assert!(dir.path().join("2024-03-14").is_dir());
        assert!(dir.path().join("index.json").exists());
    }
}
