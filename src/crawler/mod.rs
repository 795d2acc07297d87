//! Crawler module for listing page fetching and processing
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with a growing-timeout retry policy
//! - Locator-based product extraction with per-field fallbacks
//! - Lazy iteration over a page range
//! - Overall run coordination

mod coordinator;
mod extractor;
mod fetcher;
mod locator;
mod pages;

pub use coordinator::{Coordinator, RunParams, RunSummary};
pub use extractor::ProductExtractor;
pub use fetcher::{build_http_client, PageFetcher, RetryPolicy};
pub use locator::{Locator, LocatorChain, NodePath};
pub use pages::PageIterator;

use crate::config::Config;
use crate::reconcile::ReconciliationCache;
use crate::storage::RecordSink;
use std::sync::Arc;
use std::time::Duration;

/// Builds a coordinator from a loaded configuration
///
/// The cache is created here, once, and lives as long as the coordinator and
/// its clones.
pub fn coordinator_from_config(config: &Config, sink: Arc<dyn RecordSink>) -> Coordinator {
    let cache = Arc::new(ReconciliationCache::new(
        config.cache.capacity,
        Duration::from_secs(config.cache.ttl_secs),
    ));
    tracing::debug!(
        "Reconciliation cache holds up to {} codes for {}s",
        cache.capacity(),
        config.cache.ttl_secs
    );

    Coordinator::new(config.fetcher.clone(), config.site.clone(), cache, sink)
}
