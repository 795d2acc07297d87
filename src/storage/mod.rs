//! Storage module for persisting scraped products
//!
//! Every processed product is appended as one row to an append-only sink,
//! whatever its classification. The log is a full history rather than a
//! list of changes.

mod csv_log;
mod memory;
mod traits;

pub use csv_log::CsvLogSink;
pub use memory::MemorySink;
pub use traits::{RecordSink, StorageError, StorageResult};

use std::path::Path;
use std::sync::Arc;

/// Opens the configured product log as a shareable sink
///
/// # Arguments
///
/// * `path` - Path to the comma-separated log file
///
/// # Returns
///
/// * `Ok(Arc<dyn RecordSink>)` - Log opened for appending
/// * `Err(StorageError)` - The file or its directory could not be created
pub fn open_log(path: &Path) -> StorageResult<Arc<dyn RecordSink>> {
    let sink = CsvLogSink::open(path)?;
    tracing::info!("Appending product rows to {}", sink.path().display());
    Ok(Arc::new(sink))
}
