//! Reconciliation of scraped products against previously seen prices
//!
//! The classifier is a pure function of the cached and observed price; the
//! cache wraps it so lookup, decision and write happen atomically.

mod cache;
mod classifier;

pub use cache::ReconciliationCache;
pub use classifier::{classify, CacheMutation, Classification};
