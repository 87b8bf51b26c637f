//! Configuration for the log store and aggregate reports.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default directory the harness writes its logs to.
pub const DEFAULT_LOGS_DIR: &str = "./logs";

/// Default number of logs fetched at once during aggregation.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Where logs live and how they are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the harness logs.
    pub logs_dir: PathBuf,
    /// File extensions (without the dot) treated as logs.
    pub extensions: Vec<String>,
    /// Maximum concurrent reads when aggregating many logs.
    pub concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            extensions: vec!["log".to_string(), "txt".to_string()],
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the given logs directory.
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            ..Self::default()
        }
    }

    /// Loads a YAML configuration file. Missing keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the logs directory.
    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    /// Sets the recognised log extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the aggregation concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Checks the configuration for values the store cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one log extension is required".to_string(),
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::Invalid(format!(
                "extension '{}' must be non-empty and given without a leading dot",
                ext
            )));
        }
        Ok(())
    }

    /// Whether `filename` carries one of the recognised extensions.
    pub fn is_log_file(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.logs_dir, PathBuf::from("./logs"));
        assert_eq!(config.extensions, vec!["log", "txt"]);
        assert_eq!(config.concurrency, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("/tmp/runs")
            .with_extensions(["log"])
            .with_concurrency(2);
        assert_eq!(config.logs_dir, PathBuf::from("/tmp/runs"));
        assert_eq!(config.extensions, vec!["log"]);
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(StoreConfig::default().with_concurrency(0).validate().is_err());
        assert!(StoreConfig::default()
            .with_extensions(Vec::<String>::new())
            .validate()
            .is_err());
        assert!(StoreConfig::default()
            .with_extensions([".log"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_is_log_file() {
        let config = StoreConfig::default();
        assert!(config.is_log_file("openai_gpt-5_task.log"));
        assert!(config.is_log_file("run.txt"));
        assert!(!config.is_log_file("benchmark_runs.csv"));
        assert!(!config.is_log_file("log"));
    }

    #[test]
    fn test_from_yaml_file_fills_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("arena.yaml");
        std::fs::write(&path, "logs_dir: /data/logs\nconcurrency: 4\n")
            .expect("Failed to write config");

        let config = StoreConfig::from_yaml_file(&path).expect("config should load");
        assert_eq!(config.logs_dir, PathBuf::from("/data/logs"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.extensions, vec!["log", "txt"]);
    }

    #[test]
    fn test_from_yaml_file_rejects_invalid() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("arena.yaml");
        std::fs::write(&path, "concurrency: 0\n").expect("Failed to write config");
        assert!(matches!(
            StoreConfig::from_yaml_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }
}
