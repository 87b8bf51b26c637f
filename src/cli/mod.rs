//! Command-line interface for arena-trace.
//!
//! Provides commands for listing harness logs, parsing them into
//! trajectories and aggregating pass rates.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
