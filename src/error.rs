//! Error types for arena-trace operations.
//!
//! Parsing itself never fails; these cover the boundary work around it:
//! - Reading and listing log files
//! - Loading configuration

use thiserror::Error;

/// Coarse classification for callers that only need to tell a missing log
/// apart from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Failure,
}

/// Errors that can occur while listing or reading logs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Log file '{0}' not found")]
    NotFound(String),

    #[error("Invalid log filename '{0}': must be a plain file name inside the logs directory")]
    InvalidFilename(String),

    #[error("Logs directory '{path}' is unavailable: {reason}")]
    DirectoryUnavailable { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Not-found vs. generic failure.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            _ => ErrorClass::Failure,
        }
    }

    /// HTTP-style status for transports that want one.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::NotFound => 404,
            ErrorClass::Failure => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
