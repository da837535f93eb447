//! Runtime configuration for the bulletin job.
//!
//! Configuration comes from an optional YAML file; every field has a default so
//! the job runs with no file at all. Command-line flags (see [`crate::cli`])
//! are applied on top with [`Config::apply_cli`].
//!
//! ```yaml
//! baseUrl: https://stock.mk.co.kr/news/media/infostock
//! outputRoot: ../daily-stockbrief-web/public/data
//! maxPages: 5
//! retentionDays: 30
//! indexMode: window
//! titleFilters:
//!   gainers: ["증시요약(6)"]
//!   themes: ["증시요약(3)"]
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Shape of `index.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// `{"latestDate": "YYYY-MM-DD"}`
    #[default]
    Latest,
    /// `{"dates": [...]}`, newest first.
    Window,
}

/// Conjunctive title filters, one per article category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TitleFilters {
    pub gainers: Vec<String>,
    pub themes: Vec<String>,
}

impl Default for TitleFilters {
    fn default() -> Self {
        Self {
            gainers: vec!["증시요약(6)".to_string()],
            themes: vec!["증시요약(3)".to_string()],
        }
    }
}

/// Upper bound accepted for `http.maxRetries`.
pub const MAX_RETRIES_LIMIT: usize = 10;

/// HTTP loader settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    pub user_agent: String,
    /// Listing and article page navigation.
    pub listing_timeout_secs: u64,
    /// Candidate detail page navigation during the date check.
    pub detail_timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("daily_stockbrief/", env!("CARGO_PKG_VERSION")).to_string(),
            listing_timeout_secs: 60,
            detail_timeout_secs: 45,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

impl HttpConfig {
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Per-ticker lookup that fills trading value, market cap and listed shares.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnrichmentConfig {
    pub enabled: bool,
    /// Page URL with a `{code}` placeholder.
    pub url_template: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url_template: "https://finance.naver.com/item/main.naver?code={code}".to_string(),
        }
    }
}

impl EnrichmentConfig {
    pub fn url_for(&self, code: &str) -> String {
        self.url_template.replace("{code}", code)
    }
}

/// Output file names, relative to the output root or a date directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileNames {
    pub gainers: String,
    pub themes: String,
    pub ledger: String,
    pub index: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            gainers: "gainers.json".to_string(),
            themes: "themes.json".to_string(),
            ledger: "master.json".to_string(),
            index: "index.json".to_string(),
        }
    }
}

/// Top-level configuration passed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub base_url: String,
    pub output_root: PathBuf,
    pub max_pages: usize,
    /// Number of most recent date directories to keep; `None` keeps everything.
    pub retention_days: Option<usize>,
    pub index_mode: IndexMode,
    pub title_filters: TitleFilters,
    pub http: HttpConfig,
    pub enrichment: EnrichmentConfig,
    pub files: FileNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://stock.mk.co.kr/news/media/infostock".to_string(),
            output_root: PathBuf::from("../daily-stockbrief-web/public/data"),
            max_pages: 5,
            retention_days: None,
            index_mode: IndexMode::default(),
            title_filters: TitleFilters::default(),
            http: HttpConfig::default(),
            enrichment: EnrichmentConfig::default(),
            files: FileNames::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = serde_yaml::from_str(raw)?;
        if config.max_pages == 0 {
            return Err("maxPages must be at least 1".into());
        }
        if config.retention_days == Some(0) {
            return Err("retentionDays must be at least 1".into());
        }
        if config.http.max_retries > MAX_RETRIES_LIMIT {
            return Err(format!("http.maxRetries must be at most {MAX_RETRIES_LIMIT}").into());
        }
        Ok(config)
    }

    /// Overlay command-line values onto the loaded configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(root) = &cli.output_root {
            self.output_root = root.clone();
        }
        if let Some(url) = &cli.base_url {
            self.base_url = url.clone();
        }
        if let Some(pages) = cli.max_pages {
            self.max_pages = pages.max(1);
        }
        if let Some(days) = cli.retention_days {
            self.retention_days = Some(days.max(1));
        }
    }
}
