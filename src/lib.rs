//! Stall-Scraper: a listing scraper with change tracking
//!
//! This crate fetches paginated product listings from a single shop, extracts
//! structured product records, classifies each record against a short-lived
//! price cache and appends every record to an append-only log. The operation
//! is exposed behind an authenticated HTTP endpoint.

pub mod config;
pub mod crawler;
pub mod product;
pub mod reconcile;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Main error type for scrape runs
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Offset cannot be greater than limit (offset {offset}, limit {limit})")]
    OffsetAfterLimit { offset: u32, limit: u32 },

    #[error("Invalid proxy '{proxy}': {source}")]
    InvalidProxy {
        proxy: String,
        source: reqwest::Error,
    },

    #[error("Failed to get products from {url} after {attempts} attempts: {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while turning page markup into product records
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },

    #[error("Invalid CSS selector '{0}'")]
    InvalidSelector(String),

    #[error("No locator matched field '{field}' on card {card}")]
    MissingField { field: &'static str, card: usize },

    #[error("Product URL '{url}' has no path segment to use as code")]
    MissingCode { url: String },

    #[error("Invalid product URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid locator rule: {0}")]
    InvalidPattern(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RunParams, RunSummary};
pub use product::{PageResult, ProductRecord};
pub use reconcile::{Classification, ReconciliationCache};
