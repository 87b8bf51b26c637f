//! Per-model pass rates across a set of logs.
//!
//! Each log contributes one verdict (the final `Total tests` / `Passed X/Y`
//! line) to the bucket of the model its filename resolves to. Logs that
//! cannot be read are skipped and counted, never fatal.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::log_store::LogStore;
use crate::trajectory::{filename, outcome};

/// Success counts for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPassRate {
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
    /// `passed / total`, 0.0 when there are no runs.
    pub pass_rate: f64,
}

impl ModelPassRate {
    fn record(&mut self, success: bool) {
        if success {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.total += 1;
        self.pass_rate = f64::from(self.passed) / f64::from(self.total);
    }
}

/// Pass rates keyed by display model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassRateSummary {
    pub by_model: BTreeMap<String, ModelPassRate>,
    /// Logs that could not be read.
    pub skipped: u32,
}

impl PassRateSummary {
    /// Runs counted across every model.
    pub fn total_runs(&self) -> u32 {
        self.by_model.values().map(|rate| rate.total).sum()
    }
}

/// Fetches every log in `filenames` (at most `concurrency` at a time) and
/// tallies success per model.
///
/// The result does not depend on fetch order.
pub async fn aggregate_pass_rates(store: &LogStore, filenames: &[String]) -> PassRateSummary {
    let limiter = Arc::new(Semaphore::new(store.config().concurrency.max(1)));

    let fetches = filenames.iter().map(|name| {
        let limiter = limiter.clone();
        async move {
            let _permit = limiter.acquire().await.ok();
            (name, store.read(name).await)
        }
    });
    let results = futures::future::join_all(fetches).await;

    let mut summary = PassRateSummary::default();
    for (name, result) in results {
        match result {
            Ok(content) => {
                let model = filename::resolve(name).model_name;
                summary
                    .by_model
                    .entry(model)
                    .or_default()
                    .record(outcome::final_success(&content));
            }
            Err(e) => {
                warn!(filename = %name, error = %e, "Skipping log in pass-rate aggregation");
                summary.skipped += 1;
            }
        }
    }

    info!(
        logs = filenames.len(),
        models = summary.by_model.len(),
        skipped = summary.skipped,
        "Aggregated pass rates"
    );
    summary
}
