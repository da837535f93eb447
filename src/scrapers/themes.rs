//! Body extraction from the featured-themes article.
//!
//! The body is gathered by the first strategy in [`THEME_STRATEGIES`] that
//! yields any text. Later strategies only substitute for earlier ones; their
//! output is never merged.

use crate::browser::{Page, inner_text};
use tracing::{debug, info, instrument, warn};

/// A named extraction strategy: page in, trimmed non-empty blocks out.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    pub extract: fn(&Page) -> Vec<String>,
}

/// Strategies in priority order.
pub const THEME_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "left-aligned cells",
        extract: left_aligned_cells,
    },
    Strategy {
        name: "content paragraphs",
        extract: content_paragraphs,
    },
];

/// Trimmed, non-empty text of every element matching `selector`.
fn text_blocks(page: &Page, selector: &str) -> Vec<String> {
    match page.query_all(selector) {
        Ok(elements) => elements
            .iter()
            .map(inner_text)
            .filter(|text| !text.is_empty())
            .collect(),
        Err(e) => {
            warn!(%selector, error = %e, "Theme selector failed");
            Vec::new()
        }
    }
}

/// Table cells styled `text-align:left`, where the theme write-ups live.
pub fn left_aligned_cells(page: &Page) -> Vec<String> {
    text_blocks(
        page,
        r#"td[style*="text-align:left"], td[style*="text-align: left"]"#,
    )
}

/// Paragraphs under the known article body containers.
pub fn content_paragraphs(page: &Page) -> Vec<String> {
    text_blocks(page, "#news_text p, .news_text p, article p")
}

/// Apply `strategies` in order and return the first non-empty result.
pub fn first_non_empty(page: &Page, strategies: &[Strategy]) -> Vec<String> {
    for strategy in strategies {
        let blocks = (strategy.extract)(page);
        if !blocks.is_empty() {
            debug!(strategy = strategy.name, blocks = blocks.len(), "Theme strategy matched");
            return blocks;
        }
        debug!(strategy = strategy.name, "Theme strategy yielded nothing");
    }
    Vec::new()
}

/// Ordered text blocks of the themes article body.
#[instrument(level = "info", skip_all, fields(url = %page.url()))]
pub fn extract_theme_body(page: &Page) -> Vec<String> {
    let blocks = first_non_empty(page, THEME_STRATEGIES);
    info!(blocks = blocks.len(), "Extracted theme body");
    blocks
}
