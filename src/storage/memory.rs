//! In-memory record sink

use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use std::sync::Mutex;

/// Sink that keeps rows in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows appended so far, in order
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSink for MemorySink {
    fn append(&self, line: &str) -> StorageResult<()> {
        self.lines
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?
            .push(line.to_string());
        Ok(())
    }
}
