//! Access to harness logs on disk.
//!
//! # Overview
//!
//! - **LogStore**: lists, reads and parses the logs in one directory
//! - **Pass rates**: per-model success counts across many logs, fetched
//!   concurrently
//!
//! # Usage
//!
//! ```rust,ignore
//! use arena_trace::config::StoreConfig;
//! use arena_trace::storage::{aggregate_pass_rates, LogStore};
//!
//! let store = LogStore::new(StoreConfig::new("./logs"));
//! for entry in store.list().await? {
//!     let trajectory = store.parse(&entry.filename).await?;
//!     println!("{} -> {}", entry.filename, trajectory.final_success);
//! }
//!
//! let names = vec!["openai_gpt-5_task.log".to_string()];
//! let summary = aggregate_pass_rates(&store, &names).await;
//! ```

pub mod log_store;
pub mod pass_rate;

pub use log_store::{LogEntry, LogStore};
pub use pass_rate::{aggregate_pass_rates, ModelPassRate, PassRateSummary};
