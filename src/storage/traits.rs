//! Storage traits and error types
//!
//! This module defines the trait interface for record sinks and
//! associated error types.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to render row: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sink lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only destination for rendered product rows
///
/// Implementations are shared between concurrent runs and must write each
/// line as a unit: two appends never interleave.
pub trait RecordSink: Send + Sync {
    /// Appends one complete line, including its trailing newline
    fn append(&self, line: &str) -> StorageResult<()>;
}
