//! Page loading with exponential backoff retry logic.
//!
//! The rendering engine is a black box to the rest of the job: anything that
//! can turn a URL into HTML within a timeout implements [`PageLoader`].
//!
//! # Architecture
//!
//! - [`PageLoader`]: Core trait defining async page loads
//! - [`HttpLoader`]: Plain `reqwest` fetch of the server-rendered HTML
//! - [`RetryLoader`]: Decorator that retries transient failures of any loader
//!
//! # Retry Strategy
//!
//! - Only [`QueryFailure::is_transient`] failures are retried (connection
//!   errors, 429 and 5xx); timeouts and other statuses fail immediately
//! - Exponential backoff from the configured base delay, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::browser::QueryFailure;
use crate::config::HttpConfig;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Trait for async page loads.
///
/// Implementations return the page HTML, or a [`QueryFailure`] describing
/// why the page could not be reached within `timeout`.
pub trait PageLoader {
    async fn load(&self, url: &str, timeout: Duration) -> Result<String, QueryFailure>;
}

/// Fetches server-rendered HTML over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(config: &HttpConfig) -> Result<Self, QueryFailure> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl PageLoader for HttpLoader {
    #[instrument(level = "debug", skip(self, timeout))]
    async fn load(&self, url: &str, timeout: Duration) -> Result<String, QueryFailure> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| QueryFailure::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryFailure::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| QueryFailure::from_reqwest(e, url))?;
        debug!(bytes = body.len(), elapsed_ms = t0.elapsed().as_millis() as u64, "Loaded page");
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`PageLoader`].
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryLoader<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryLoader<T>
where
    T: PageLoader,
{
    /// Create a new retry wrapper.
    ///
    /// # Arguments
    ///
    /// * `inner` - The loader to wrap
    /// * `max_retries` - Retries after the first attempt (0 disables retrying)
    /// * `base_delay` - Delay before the first retry; doubles on each further one
    ///
    /// The delay is capped at 30 seconds before jitter is added.
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Backoff before retry number `attempt` (1-based), without jitter.
    fn backoff(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt.saturating_sub(1))
            .ok()
            .and_then(|shift| 1u32.checked_shl(shift))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLoader")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> PageLoader for RetryLoader<T>
where
    T: PageLoader,
{
    async fn load(&self, url: &str, timeout: Duration) -> Result<String, QueryFailure> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.load(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            %url,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "load() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + Duration::from_millis(jitter_ms);

                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "load() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Build the production loader from configuration.
///
/// # Errors
///
/// Returns [`QueryFailure::Http`] if the HTTP client cannot be constructed
/// (e.g. the TLS backend fails to initialize).
pub fn http_loader(config: &HttpConfig) -> Result<RetryLoader<HttpLoader>, QueryFailure> {
    Ok(RetryLoader::new(
        HttpLoader::new(config)?,
        config.max_retries,
        config.retry_base_delay(),
    ))
}
