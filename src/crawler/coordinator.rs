//! Scrape run coordinator - orchestration of one scrape request
//!
//! A run walks the requested page range, classifies every product against
//! the shared reconciliation cache and appends every product to the log.
//! The first fetch, extraction or storage error ends the run; rows written
//! for earlier pages stay in the log.

use crate::config::{FetcherConfig, SiteRules};
use crate::crawler::extractor::ProductExtractor;
use crate::crawler::fetcher::{PageFetcher, RetryPolicy};
use crate::crawler::pages::PageIterator;
use crate::product::SCRAPED_AT_FORMAT;
use crate::reconcile::{Classification, ReconciliationCache};
use crate::storage::RecordSink;
use crate::ScrapeError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Parameters of one scrape request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParams {
    /// Last page to scrape, inclusive
    pub limit: u32,
    /// First page to scrape
    pub offset: u32,
    /// Proxy URL for HTTP and HTTPS; empty for a direct connection
    pub proxy: String,
}

impl RunParams {
    pub fn new(offset: u32, limit: u32, proxy: impl Into<String>) -> Self {
        Self {
            limit,
            offset,
            proxy: proxy.into(),
        }
    }

    /// Rejects ranges that start after they end
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.offset > self.limit {
            return Err(ScrapeError::OffsetAfterLimit {
                offset: self.offset,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Number of pages in the range, saturating at `u32::MAX`
    pub fn page_count(&self) -> u32 {
        if self.offset > self.limit {
            0
        } else {
            (self.limit - self.offset).saturating_add(1)
        }
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self::new(1, 1, "")
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub params: RunParams,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(params: RunParams) -> Self {
        Self {
            created: 0,
            updated: 0,
            unchanged: 0,
            params,
            elapsed: Duration::ZERO,
        }
    }

    pub fn total(&self) -> u64 {
        self.created + self.updated + self.unchanged
    }

    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Created => self.created += 1,
            Classification::Updated => self.updated += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
    }
}

/// Runs scrapes against shared cache and log
#[derive(Clone)]
pub struct Coordinator {
    fetcher_config: Arc<FetcherConfig>,
    site: Arc<SiteRules>,
    retry_policy: Option<RetryPolicy>,
    cache: Arc<ReconciliationCache>,
    sink: Arc<dyn RecordSink>,
}

impl Coordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher_config` - Listing base URL, retry settings and user agent
    /// * `site` - Locator rules for the shop's markup
    /// * `cache` - Reconciliation cache shared by every run
    /// * `sink` - Append-only product log shared by every run
    pub fn new(
        fetcher_config: FetcherConfig,
        site: SiteRules,
        cache: Arc<ReconciliationCache>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            fetcher_config: Arc::new(fetcher_config),
            site: Arc::new(site),
            retry_policy: None,
            cache,
            sink,
        }
    }

    /// Overrides the retry policy derived from the fetcher configuration
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Runs one scrape
    ///
    /// Every product of every page is classified and appended to the log,
    /// unchanged products included.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - Every page in the range was processed
    /// * `Err(ScrapeError::OffsetAfterLimit)` - Nothing was fetched or written
    /// * `Err(ScrapeError)` - The run stopped at the first failing page or row
    pub async fn run(&self, params: RunParams) -> Result<RunSummary, ScrapeError> {
        params.validate()?;

        let mut fetcher = PageFetcher::new(&self.fetcher_config, &params.proxy)?;
        if let Some(policy) = self.retry_policy {
            fetcher = fetcher.with_policy(policy);
        }
        let extractor = ProductExtractor::new(&self.site)?;

        let started = Instant::now();
        tracing::info!(
            "Operation start time: {}.",
            Local::now().format(SCRAPED_AT_FORMAT)
        );
        tracing::info!(
            "Scraping {} page(s), {} to {}.",
            params.page_count(),
            params.offset,
            params.limit
        );

        let mut summary = RunSummary::new(params);
        let mut pages = PageIterator::new(
            &fetcher,
            &extractor,
            summary.params.offset,
            summary.params.limit,
        );

        while let Some(page) = pages.next().await {
            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    tracing::error!("Scrape aborted: {}", e);
                    return Err(e);
                }
            };

            for record in page {
                let classification = self.cache.reconcile(&record.code, &record.price);
                tracing::debug!(
                    "Product {} {} at price {}",
                    record.code,
                    classification,
                    record.price
                );
                summary.record(classification);
                self.sink.append(&record.to_log_row()?)?;
            }
        }

        summary.elapsed = started.elapsed();
        log_summary(&summary);
        Ok(summary)
    }
}

fn log_summary(summary: &RunSummary) {
    tracing::info!("Operation completed successfully.");
    tracing::info!("Total products scraped: {}.", summary.total());
    tracing::info!(
        "Summary: created: {}; updated: {}; unchanged: {}.",
        summary.created,
        summary.updated,
        summary.unchanged
    );
    tracing::info!(
        "Total time taken in seconds to scrape: {}.",
        summary.elapsed.as_secs()
    );
    tracing::info!(
        "Operation end time: {}.",
        Local::now().format(SCRAPED_AT_FORMAT)
    );
    tracing::info!(
        "Params used - Limit: {}; Offset: {}; Proxy: {}.",
        summary.params.limit,
        summary.params.offset,
        summary.params.proxy
    );
}
