//! Finding today's bulletin article on the paginated listing.
//!
//! The listing carries many near-identical bulletin titles, one set per day.
//! Categories are told apart by a conjunctive title filter (e.g. the
//! `증시요약(6)` numbering tag), and days by the date shown on each
//! candidate's detail page.
//!
//! Candidates are checked strictly in listing order and the first accepted
//! one wins. Each detail page is dropped before the next candidate is opened.

use crate::browser::{Browser, Page, attribute, inner_text};
use crate::loader::PageLoader;
use crate::models::ArticleRef;
use crate::scrapers::dates::{Today, Verdict, matches};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Detail-page date elements, highest priority first.
pub const DATE_SELECTORS: &[&str] = &[".news_date", ".date", "span.date", ".info_date"];

const NEXT_SELECTORS: &[&str] = &["a.next", "a.paging_next"];
const NEXT_LABEL: &str = "다음";

static BULLETIN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\(증시요약\(\d+\)\)").unwrap());

/// Strip the ` (증시요약(N))` numbering suffix from an anchor title.
pub fn clean_title(title: &str) -> String {
    BULLETIN_SUFFIX.replace_all(title, "").trim().to_string()
}

/// Search parameters for one article category.
#[derive(Debug, Clone)]
pub struct LocateRequest<'a> {
    pub listing_url: &'a str,
    pub required: &'a [String],
    pub max_pages: usize,
    pub listing_timeout: Duration,
    pub detail_timeout: Duration,
}

/// Anchors on a listing page whose text contains every required substring.
///
/// Anchors without readable text or href are skipped.
pub fn candidates(page: &Page, required: &[String]) -> Vec<(String, String)> {
    let anchors = match page.query_all("a") {
        Ok(anchors) => anchors,
        Err(e) => {
            warn!(error = %e, "Could not enumerate listing anchors");
            return Vec::new();
        }
    };

    anchors
        .iter()
        .filter_map(|a| {
            let text = inner_text(a).replace('\n', " ");
            if text.is_empty() || !required.iter().all(|s| text.contains(s.as_str())) {
                return None;
            }
            let href = attribute(a, "href").ok()?;
            match page.resolve(href) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    Some((text, url.to_string()))
                }
                Ok(url) => {
                    debug!(title = %truncate_for_log(&text, 80), scheme = url.scheme(), "Skipping non-http anchor");
                    None
                }
                Err(e) => {
                    debug!(title = %truncate_for_log(&text, 80), error = %e, "Skipping anchor");
                    None
                }
            }
        })
        .collect()
}

/// URL behind the listing's "next page" control, if there is a usable one.
pub fn next_page_url(page: &Page) -> Option<String> {
    let by_class = NEXT_SELECTORS
        .iter()
        .flat_map(|sel| page.query_all(sel).unwrap_or_default())
        .next();
    let control = by_class.or_else(|| {
        page.query_all("a")
            .unwrap_or_default()
            .into_iter()
            .find(|a| inner_text(a) == NEXT_LABEL)
    })?;

    let href = attribute(&control, "href").ok()?.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    page.resolve(href).ok().map(|u| u.to_string())
}

/// Open a candidate's detail page and read its displayed date.
///
/// `None` means the page could not be opened; the caller skips it.
async fn read_candidate_date<L: PageLoader>(
    browser: &Browser<L>,
    url: &str,
    timeout: Duration,
) -> Option<String> {
    match browser.open(url, timeout).await {
        Ok(detail) => Some(detail.first_text(DATE_SELECTORS).unwrap_or_default()),
        Err(e) => {
            warn!(%url, error = %e, "Candidate page failed to load; skipping");
            None
        }
    }
}

/// Scan up to `max_pages` listing pages and return the first candidate whose
/// date is accepted for `today`.
///
/// Candidates are checked in listing order, page by page; the first accepted
/// one is returned even if a later one has a more precise date. Every detail
/// page is dropped before the next candidate is opened.
///
/// # Arguments
///
/// * `browser` - Opens listing and detail pages
/// * `request` - Listing URL, title filter, page bound and timeouts
/// * `today` - The run date and its string markers
///
/// # Returns
///
/// The accepted article, or `None` if the listing could not be loaded or no
/// candidate was accepted within `max_pages` pages.
#[instrument(level = "info", skip_all, fields(required = ?request.required))]
pub async fn locate<L: PageLoader>(
    browser: &Browser<L>,
    request: &LocateRequest<'_>,
    today: &Today,
) -> Option<ArticleRef> {
    let mut listing = match browser.open(request.listing_url, request.listing_timeout).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url = %request.listing_url, error = %e, "Listing page failed to load");
            return None;
        }
    };

    for page_no in 1..=request.max_pages {
        let found = candidates(&listing, request.required);
        info!(page_no, candidates = found.len(), "Scanning listing page");

        for (title, url) in found {
            let Some(date_text) = read_candidate_date(browser, &url, request.detail_timeout).await
            else {
                continue;
            };

            let verdict = matches(&date_text, today);
            debug!(%url, %date_text, ?verdict, "Checked candidate date");
            if !verdict.is_accepted() {
                continue;
            }
            if verdict == Verdict::AcceptWithUncertainty {
                warn!(%url, %date_text, "Accepting candidate without a provable date");
            }

            let article = ArticleRef {
                title: clean_title(&title),
                url,
                date_text,
            };
            info!(title = %article.title, url = %article.url, "Located today's article");
            return Some(article);
        }

        if page_no == request.max_pages {
            break;
        }
        let Some(next) = next_page_url(&listing) else {
            debug!(page_no, "No next-page control; stopping");
            break;
        };
        listing = match browser.open(&next, request.listing_timeout).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %next, error = %e, "Next listing page failed to load");
                break;
            }
        };
    }

    info!("No article for today");
    None
}
