//! Article discovery and content extraction for the infostock bulletin.
//!
//! Each run handles two article categories, one after the other:
//!
//! | Category | Filter (default) | Extractor | Snapshot |
//! |----------|------------------|-----------|----------|
//! | Limit-up / surging stocks | `증시요약(6)` | [`gainers`] | `gainers.json` |
//! | Featured themes | `증시요약(3)` | [`themes`] | `themes.json` |
//!
//! # Flow
//!
//! 1. [`locator::locate`] pages through the listing and returns the first
//!    candidate whose date [`dates::matches`] accepts
//! 2. The article page is opened and handed to the category's extractor
//! 3. Gainers are optionally enriched per ticker ([`enrich`])
//!
//! Nothing here fails the run: a missing article or empty extraction simply
//! produces no snapshot for that category.

pub mod dates;
pub mod enrich;
pub mod gainers;
pub mod locator;
pub mod themes;

use crate::browser::{Browser, Page};
use crate::config::Config;
use crate::loader::PageLoader;
use crate::models::{ArticleRef, GAINERS_TITLE, GainerSnapshot, THEMES_TITLE, ThemeSnapshot};
use dates::Today;
use locator::{LocateRequest, locate};
use tracing::{info, instrument, warn};

fn request<'a>(config: &'a Config, required: &'a [String]) -> LocateRequest<'a> {
    LocateRequest {
        listing_url: &config.base_url,
        required,
        max_pages: config.max_pages,
        listing_timeout: config.http.listing_timeout(),
        detail_timeout: config.http.detail_timeout(),
    }
}

/// Locate and extract today's gainers article.
///
/// # Arguments
///
/// * `browser` - Opens listing, article and quote pages
/// * `config` - Listing URL, gainers title filter, timeouts and enrichment
/// * `today` - The run date
///
/// # Returns
///
/// `None` when no article was found or the page failed to load. The snapshot
/// may still have no items; the accumulator decides what that means.
#[instrument(level = "info", skip_all, fields(date = %today.dashed()))]
pub async fn scrape_gainers<L: PageLoader>(
    browser: &Browser<L>,
    config: &Config,
    today: &Today,
) -> Option<GainerSnapshot> {
    let article = locate(browser, &request(config, &config.title_filters.gainers), today).await?;

    let items = {
        let page = open_article(browser, config, &article).await?;
        gainers::extract_gainers(&page)
    };

    let items = if config.enrichment.enabled && !items.is_empty() {
        enrich::enrich_gainers(browser, items, &config.enrichment, config.http.detail_timeout())
            .await
    } else {
        items
    };

    info!(title = %article.title, date_text = %article.date_text, items = items.len(), "Gainers scraped");
    Some(GainerSnapshot {
        title: GAINERS_TITLE.to_string(),
        url: article.url,
        date: today.dashed(),
        items,
    })
}

/// Locate and extract today's featured-themes article.
///
/// Same contract as [`scrape_gainers`]; the body is the extracted blocks
/// joined with `\n` and may be empty.
#[instrument(level = "info", skip_all, fields(date = %today.dashed()))]
pub async fn scrape_themes<L: PageLoader>(
    browser: &Browser<L>,
    config: &Config,
    today: &Today,
) -> Option<ThemeSnapshot> {
    let article = locate(browser, &request(config, &config.title_filters.themes), today).await?;

    let blocks = {
        let page = open_article(browser, config, &article).await?;
        themes::extract_theme_body(&page)
    };

    info!(title = %article.title, date_text = %article.date_text, blocks = blocks.len(), "Themes scraped");
    Some(ThemeSnapshot {
        title: THEMES_TITLE.to_string(),
        url: article.url,
        date: today.dashed(),
        body: blocks.join("\n"),
    })
}

async fn open_article<L: PageLoader>(
    browser: &Browser<L>,
    config: &Config,
    article: &ArticleRef,
) -> Option<Page> {
    match browser.open(&article.url, config.http.listing_timeout()).await {
        Ok(page) => Some(page),
        Err(e) => {
            warn!(url = %article.url, error = %e, "Article page failed to load");
            None
        }
    }
}
