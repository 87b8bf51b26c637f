//! arena-trace: trajectory reconstruction for coding-agent benchmark logs.
//!
//! This library turns the free-form text logs written by an agent benchmark
//! harness into structured trajectories, and aggregates pass rates across
//! many runs.

pub mod cli;
pub mod config;
pub mod error;
pub mod storage;
pub mod trajectory;

// Re-export commonly used types
pub use config::StoreConfig;
pub use error::{ConfigError, ErrorClass, StoreError};
pub use storage::{aggregate_pass_rates, LogStore, PassRateSummary};
pub use trajectory::{parse, Trajectory};
