//! Directory-backed log store.
//!
//! Logs are addressed by bare filename. Anything that could escape the
//! configured directory is rejected before touching the filesystem.

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::trajectory::{self, Trajectory};

/// A log file available in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
}

/// Read-only view over a directory of harness logs.
#[derive(Debug, Clone)]
pub struct LogStore {
    config: StoreConfig,
}

impl LogStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Creates a store after validating `config`.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the logs directory.
    pub fn logs_dir(&self) -> &PathBuf {
        &self.config.logs_dir
    }

    /// Lists the log files in the directory, sorted by filename.
    ///
    /// Subdirectories and files without a recognised extension are skipped.
    pub async fn list(&self) -> Result<Vec<LogEntry>, StoreError> {
        let dir = &self.config.logs_dir;
        let mut reader = fs::read_dir(dir)
            .await
            .map_err(|e| self.unavailable(e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| self.unavailable(e))? {
            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = ?entry.path(), "Skipping log with non UTF-8 filename");
                continue;
            };
            if !self.config.is_log_file(&filename) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    warn!(filename = %filename, error = %e, "Skipping unreadable log");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            entries.push(LogEntry {
                filename,
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        info!(dir = %dir.display(), count = entries.len(), "Listed logs");
        Ok(entries)
    }

    /// Reads a log by filename.
    ///
    /// Invalid bytes are replaced rather than rejected, so any file can be
    /// handed to the parser.
    pub async fn read(&self, filename: &str) -> Result<String, StoreError> {
        validate_filename(filename)?;
        let path = self.config.logs_dir.join(filename);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(StoreError::Io(e)),
        };
        debug!(filename, bytes = bytes.len(), "Read log");

        Ok(match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Reads and parses a log.
    pub async fn parse(&self, filename: &str) -> Result<Trajectory, StoreError> {
        let content = self.read(filename).await?;
        Ok(trajectory::parse(filename, &content))
    }

    fn unavailable(&self, e: std::io::Error) -> StoreError {
        StoreError::DirectoryUnavailable {
            path: self.config.logs_dir.display().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Accepts only a plain file name: no separators, no `.`/`..` components.
fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let invalid = filename.trim().is_empty()
        || filename.contains(['/', '\\', '\0'])
        || filename == "."
        || filename == "..";
    if invalid {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}
