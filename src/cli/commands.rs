//! CLI command definitions for arena-trace.
//!
//! Every command works against one logs directory, taken from `--logs-dir`,
//! `ARENA_LOGS_DIR`, a YAML config file or the default `./logs`, in that
//! order of precedence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::StoreConfig;
use crate::storage::{aggregate_pass_rates, LogStore, PassRateSummary};
use crate::trajectory::{self, Trajectory};

/// Trajectory parser for coding-agent benchmark logs.
#[derive(Parser)]
#[command(name = "arena-trace")]
#[command(about = "Reconstruct agent trajectories from benchmark harness logs")]
#[command(version)]
#[command(
    long_about = "arena-trace turns the free-form logs written by the benchmark harness into structured trajectories: tool-call steps, test outcomes, diffs and lab metrics.\n\nExample usage:\n  arena-trace --logs-dir ./logs list\n  arena-trace parse openai_gpt-5_add-is-odd.log\n  arena-trace pass-rates --json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Directory containing harness logs.
    #[arg(long, env = "ARENA_LOGS_DIR", global = true)]
    pub logs_dir: Option<PathBuf>,

    /// YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum logs read at once during aggregation.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Output JSON to stdout instead of a human-readable summary.
    #[arg(short = 'j', long, global = true)]
    pub json: bool,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the logs in the logs directory.
    #[command(alias = "ls")]
    List,

    /// Parse one log from the logs directory and print its trajectory.
    Parse {
        /// Log filename, relative to the logs directory.
        filename: String,
    },

    /// Parse a log at an arbitrary path.
    ParseFile {
        /// Path to the log file.
        path: PathBuf,
    },

    /// Per-model pass rates. Defaults to every listed log.
    PassRates {
        /// Log filenames to include.
        filenames: Vec<String>,
    },
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let store = LogStore::open(resolve_config(&cli)?)?;

    match cli.command {
        Commands::List => run_list_command(&store, cli.json).await,
        Commands::Parse { filename } => {
            let trajectory = store
                .parse(&filename)
                .await
                .with_context(|| format!("Failed to parse log '{}'", filename))?;
            print_trajectory(&trajectory, cli.json)
        }
        Commands::ParseFile { path } => run_parse_file_command(&path, cli.json).await,
        Commands::PassRates { filenames } => {
            run_pass_rates_command(&store, filenames, cli.json).await
        }
    }
}

/// Config file first, then explicit flags on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &cli.logs_dir {
        config = config.with_logs_dir(dir);
    }
    if let Some(concurrency) = cli.concurrency {
        config = config.with_concurrency(concurrency);
    }
    Ok(config)
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn run_list_command(store: &LogStore, json: bool) -> anyhow::Result<()> {
    let entries = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Logs in {}:", store.logs_dir().display());
    for entry in &entries {
        println!("  {:<60} {:>10} bytes", entry.filename, entry.size);
    }
    println!("{} log(s)", entries.len());
    Ok(())
}

async fn run_parse_file_command(path: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    info!("Parsing {}", path.display());
    print_trajectory(&trajectory::parse(filename, &content), json)
}

async fn run_pass_rates_command(
    store: &LogStore,
    filenames: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let filenames = if filenames.is_empty() {
        store
            .list()
            .await?
            .into_iter()
            .map(|entry| entry.filename)
            .collect()
    } else {
        filenames
    };

    let summary = aggregate_pass_rates(store, &filenames).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_pass_rates(&summary);
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

/// Trajectories are always JSON; `--json` only switches to compact form.
fn print_trajectory(trajectory: &Trajectory, json: bool) -> anyhow::Result<()> {
    let out = if json {
        serde_json::to_string(trajectory)?
    } else {
        serde_json::to_string_pretty(trajectory)?
    };
    println!("{out}");
    Ok(())
}

fn print_pass_rates(summary: &PassRateSummary) {
    println!("\n=== Pass Rates ===");
    for (model, rate) in &summary.by_model {
        println!(
            "  {:<28} {:>4}/{:<4} passed  ({:.1}%)",
            model,
            rate.passed,
            rate.total,
            rate.pass_rate * 100.0
        );
    }
    println!("Total runs:     {}", summary.total_runs());
    if summary.skipped > 0 {
        println!("Skipped logs:   {}", summary.skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["arena-trace", "--logs-dir", "/tmp/l", "list"])
            .expect("list should parse");
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.logs_dir, Some(PathBuf::from("/tmp/l")));
        assert_eq!(cli.log_level, "info");

        let cli = Cli::try_parse_from(["arena-trace", "parse", "a.log", "--json"])
            .expect("parse should parse");
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Parse { ref filename } if filename == "a.log"));

        let cli = Cli::try_parse_from(["arena-trace", "pass-rates", "a.log", "b.log"])
            .expect("pass-rates should parse");
        match cli.command {
            Commands::PassRates { filenames } => assert_eq!(filenames, vec!["a.log", "b.log"]),
            _ => panic!("expected pass-rates"),
        }
    }

    #[test]
    fn test_resolve_config_applies_flags() {
        let cli = Cli::try_parse_from([
            "arena-trace",
            "--logs-dir",
            "/data/logs",
            "--concurrency",
            "3",
            "list",
        ])
        .expect("should parse");
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.logs_dir, PathBuf::from("/data/logs"));
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_zero_concurrency_fails_store_open() {
        let cli = Cli::try_parse_from(["arena-trace", "--concurrency", "0", "list"])
            .expect("should parse");
        let config = resolve_config(&cli).expect("flags apply without validation");
        assert!(matches!(
            LogStore::open(config),
            Err(crate::error::StoreError::Config(_))
        ));
    }
}
