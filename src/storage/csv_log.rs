//! Comma-separated product log on disk
//!
//! Rows are appended to a single file opened in append mode. Each row is
//! written and flushed under a lock, so concurrent runs never interleave.

use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Comma-separated product log opened in append mode
#[derive(Debug)]
pub struct CsvLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvLogSink {
    /// Opens (creating if needed) the log file and its parent directories
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvLogSink {
    fn append(&self, line: &str) -> StorageResult<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;

        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
