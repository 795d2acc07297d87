//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for listing pages, including:
//! - Building HTTP clients with the configured user agent and optional proxy
//! - GET requests for numbered listing pages
//! - Retry logic with a growing per-attempt timeout

use crate::config::FetcherConfig;
use crate::ScrapeError;
use reqwest::{Client, Proxy};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

/// How many times a page is requested and how long each attempt may take
///
/// Attempt `i` (starting at 1) times out after `timeout_step * i`. Every
/// failure is retried the same way; there is no pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    timeout_step: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout_step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout_step,
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.timeout_step_secs),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn attempts(&self) -> RangeInclusive<u32> {
        1..=self.max_attempts
    }

    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.timeout_step * attempt
    }
}

impl Default for RetryPolicy {
    /// Three attempts at 30, 60 and 90 seconds
    fn default() -> Self {
        Self::new(3, Duration::from_secs(30))
    }
}

/// Builds an HTTP client, routing HTTP and HTTPS through `proxy` when given
///
/// The client sets no timeouts of its own. Each request carries the timeout of
/// its attempt, which covers connecting (proxy included) as well as reading.
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(ScrapeError::InvalidProxy)` - The proxy URL was rejected
/// * `Err(ScrapeError::Client)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig, proxy: Option<&str>) -> Result<Client, ScrapeError> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        let proxy_config = Proxy::all(proxy).map_err(|source| ScrapeError::InvalidProxy {
            proxy: proxy.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy_config);
    }

    Ok(builder.build()?)
}

/// Fetches numbered listing pages
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl PageFetcher {
    /// Creates a fetcher for one run
    ///
    /// An empty `proxy` string means no proxy.
    pub fn new(config: &FetcherConfig, proxy: &str) -> Result<Self, ScrapeError> {
        let proxy = Some(proxy.trim()).filter(|p| !p.is_empty());
        let client = build_http_client(config, proxy)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            policy: RetryPolicy::from_config(config),
        })
    }

    /// Replaces the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Listing URL for a page: the base path followed by `<page>/`
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}/", self.base_url, page)
    }

    /// Fetches one listing page, retrying per the policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Timeout | Retry with the next, longer timeout |
    /// | Connection / TLS error | Retry with the next, longer timeout |
    /// | Non-2xx status | Retry with the next, longer timeout |
    /// | Body read error | Retry with the next, longer timeout |
    /// | Attempts exhausted | `ScrapeError::Fetch` |
    ///
    /// # Returns
    ///
    /// The final URL (after redirects) and the raw body
    pub async fn fetch(&self, page: u32) -> Result<(Url, Vec<u8>), ScrapeError> {
        let url = self.page_url(page);
        tracing::info!("Getting products from {}", url);

        let mut last_error = String::new();
        for attempt in self.policy.attempts() {
            match self.try_fetch(&url, self.policy.timeout_for(attempt)).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.policy.max_attempts() {
                        tracing::warn!(
                            "Failed to get products from {} ({}). Retrying with {} seconds timeout.",
                            url,
                            last_error,
                            self.policy.timeout_for(attempt + 1).as_secs_f64()
                        );
                    }
                }
            }
        }

        let error = ScrapeError::Fetch {
            url,
            attempts: self.policy.max_attempts(),
            reason: last_error,
        };
        tracing::error!("{}", error);
        Err(error)
    }

    async fn try_fetch(&self, url: &str, timeout: Duration) -> Result<(Url, Vec<u8>), reqwest::Error> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        let final_url = response.url().clone();
        let body = response.bytes().await?;
        Ok((final_url, body.to_vec()))
    }
}
