//! Created / Updated / Unchanged decisions

use serde::Serialize;
use std::fmt;

/// How an observed product relates to what the cache last saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No live cache entry for the code
    Created,
    /// Cached price differs from the observed one
    Updated,
    /// Cached price equals the observed one
    Unchanged,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Write to apply to the cache after classifying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMutation {
    Insert(String),
    Overwrite(String),
}

impl CacheMutation {
    pub fn price(&self) -> &str {
        match self {
            Self::Insert(price) | Self::Overwrite(price) => price,
        }
    }
}

/// Classifies an observed price against the cached one
///
/// Prices are compared as exact strings: `"₹100.00"`, `"100.00"` and `"100"`
/// are three different prices.
pub fn classify(previous: Option<&str>, price: &str) -> (Classification, Option<CacheMutation>) {
    match previous {
        None => (
            Classification::Created,
            Some(CacheMutation::Insert(price.to_string())),
        ),
        Some(previous) if previous == price => (Classification::Unchanged, None),
        Some(_) => (
            Classification::Updated,
            Some(CacheMutation::Overwrite(price.to_string())),
        ),
    }
}
