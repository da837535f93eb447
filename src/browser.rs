//! HTML query surface over loaded pages.
//!
//! A [`Browser`] opens pages through any [`PageLoader`] and hands out [`Page`]
//! values that own the parsed document. Every query returns
//! `Result<_, QueryFailure>` so callers decide explicitly whether a failure
//! means "skip this row/candidate/field".
//!
//! # Page lifecycle
//!
//! Dropping a [`Page`] closes it. The browser counts live pages, so a scan
//! that opens many candidate pages can assert it released all of them
//! ([`Browser::live_pages`]).

use crate::loader::PageLoader;
use scraper::{ElementRef, Html, Selector};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Why a page or element query produced nothing.
#[derive(thiserror::Error, Debug)]
pub enum QueryFailure {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("timed out loading {url}")]
    Timeout { url: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("missing attribute {0:?}")]
    MissingAttribute(String),
}

impl QueryFailure {
    pub fn from_reqwest(e: reqwest::Error, url: &str) -> Self {
        if e.is_timeout() {
            QueryFailure::Timeout {
                url: url.to_string(),
            }
        } else {
            QueryFailure::Http(e)
        }
    }

    /// Connection and send errors, 429 and 5xx are worth another attempt.
    /// Builder, redirect and body-decoding errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            QueryFailure::Http(e) => e.is_connect() || e.is_request(),
            QueryFailure::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Opens pages and tracks how many are still alive.
pub struct Browser<L> {
    loader: L,
    live: Rc<Cell<usize>>,
}

impl<L: PageLoader> Browser<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            live: Rc::new(Cell::new(0)),
        }
    }

    /// Navigate to `url` and parse the result.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to load
    /// * `timeout` - Navigation timeout passed to the loader
    ///
    /// # Returns
    ///
    /// A live [`Page`], counted until it is dropped, or the loader's failure.
    /// A failed open is never counted.
    #[instrument(level = "debug", skip(self, timeout))]
    pub async fn open(&self, url: &str, timeout: Duration) -> Result<Page, QueryFailure> {
        let parsed = Url::parse(url).map_err(|_| QueryFailure::InvalidUrl(url.to_string()))?;
        let html = self.loader.load(parsed.as_str(), timeout).await?;

        self.live.set(self.live.get() + 1);
        debug!(live = self.live.get(), "Opened page");
        Ok(Page {
            url: parsed,
            document: Html::parse_document(&html),
            live: Rc::clone(&self.live),
        })
    }

    /// Number of pages opened and not yet dropped.
    pub fn live_pages(&self) -> usize {
        self.live.get()
    }

    #[cfg(test)]
    pub fn loader(&self) -> &L {
        &self.loader
    }
}

/// A loaded page. Closed on drop.
pub struct Page {
    url: Url,
    document: Html,
    live: Rc<Cell<usize>>,
}

impl Page {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, QueryFailure> {
        let selector = parse_selector(selector)?;
        Ok(self.document.select(&selector).collect())
    }

    /// Text of the first element with non-empty text, trying `selectors` in
    /// priority order.
    pub fn first_text(&self, selectors: &[&str]) -> Option<String> {
        selectors.iter().find_map(|sel| {
            self.query_all(sel)
                .unwrap_or_default()
                .into_iter()
                .map(|el| inner_text(&el))
                .find(|text| !text.is_empty())
        })
    }

    /// Resolve a possibly relative href against this page.
    pub fn resolve(&self, href: &str) -> Result<Url, QueryFailure> {
        self.url
            .join(href.trim())
            .map_err(|_| QueryFailure::InvalidUrl(href.to_string()))
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
        debug!(url = %self.url, live = self.live.get(), "Closed page");
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector, QueryFailure> {
    Selector::parse(selector).map_err(|e| QueryFailure::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Descendants of `element` matching `selector`.
pub fn query_within<'a>(
    element: &ElementRef<'a>,
    selector: &str,
) -> Result<Vec<ElementRef<'a>>, QueryFailure> {
    let selector = parse_selector(selector)?;
    Ok(element.select(&selector).collect())
}

pub fn attribute<'a>(element: &ElementRef<'a>, name: &str) -> Result<&'a str, QueryFailure> {
    element
        .value()
        .attr(name)
        .ok_or_else(|| QueryFailure::MissingAttribute(name.to_string()))
}

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "li", "ol", "p", "section", "table", "tr", "ul",
];

/// Rendered text of an element, approximating a browser's `innerText`.
///
/// Whitespace runs collapse to one space; `<br>` and block elements start new
/// lines. Lines are trimmed and blank lines dropped.
pub fn inner_text(element: &ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(element: &ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let mut last_space = out.ends_with(' ');
            for ch in text.chars() {
                if ch.is_whitespace() {
                    if !last_space {
                        out.push(' ');
                        last_space = true;
                    }
                } else {
                    out.push(ch);
                    last_space = false;
                }
            }
        } else if let Some(el) = ElementRef::wrap(child) {
            let name = el.value().name();
            match name {
                "br" => out.push('\n'),
                "script" | "style" | "noscript" => {}
                _ if BLOCK_TAGS.contains(&name) => {
                    out.push('\n');
                    push_text(&el, out);
                    out.push('\n');
                }
                _ => push_text(&el, out),
            }
        }
    }
}
