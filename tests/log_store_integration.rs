//! Log store and pass-rate aggregation against a real directory.

use arena_trace::{aggregate_pass_rates, LogStore, StoreConfig, StoreError};
use tempfile::TempDir;

fn fixture_dir() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logs = [
        (
            "anthropic_claude-sonnet-4-5-20250929_add-is-odd.log",
            "HARNESS: Iteration 1 - making LLM call\nTotal tests: 4/4 passed\n",
        ),
        (
            "anthropic_claude-sonnet-4-5-20250929_logwatch.log",
            "Total tests: 2/4 passed\n",
        ),
        ("openai_gpt-5_add-is-odd.log", "Passed 1/1 tests (100.0%)\n"),
        ("README.md", "not a log"),
    ];
    for (name, content) in logs {
        std::fs::write(temp_dir.path().join(name), content).expect("Failed to write fixture");
    }
    temp_dir
}

#[tokio::test]
async fn test_list_then_parse_every_log() {
    let temp_dir = fixture_dir();
    let store = LogStore::new(StoreConfig::new(temp_dir.path()));

    let entries = store.list().await.expect("list");
    assert_eq!(entries.len(), 3);
    assert!(entries.windows(2).all(|w| w[0].filename <= w[1].filename));

    for entry in &entries {
        let trajectory = store.parse(&entry.filename).await.expect("parse");
        assert_eq!(trajectory.filename, entry.filename);
        assert_ne!(trajectory.model_name, "Unknown");
    }
}

#[tokio::test]
async fn test_missing_log_is_not_found() {
    let temp_dir = fixture_dir();
    let store = LogStore::new(StoreConfig::new(temp_dir.path()));

    match store.read("openai_gpt-5_nope.log").await {
        Err(StoreError::NotFound(name)) => assert_eq!(name, "openai_gpt-5_nope.log"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pass_rates_over_listing() {
    let temp_dir = fixture_dir();
    let store = LogStore::new(StoreConfig::new(temp_dir.path()).with_concurrency(1));

    let mut names: Vec<String> = store
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|e| e.filename)
        .collect();
    names.push("deleted_between_list_and_read.log".to_string());

    let summary = aggregate_pass_rates(&store, &names).await;
    assert_eq!(summary.skipped, 1);

    let claude = &summary.by_model["Claude Sonnet 4.5"];
    assert_eq!((claude.passed, claude.failed, claude.total), (1, 1, 2));

    let gpt5 = &summary.by_model["GPT-5"];
    assert_eq!((gpt5.passed, gpt5.total), (1, 1));

    let json = serde_json::to_value(&summary).expect("json");
    assert_eq!(json["byModel"]["GPT-5"]["passRate"], 1.0);
}

#[tokio::test]
async fn test_pass_rates_independent_of_concurrency() {
    let temp_dir = fixture_dir();
    let names: Vec<String> = [
        "openai_gpt-5_add-is-odd.log",
        "anthropic_claude-sonnet-4-5-20250929_logwatch.log",
        "anthropic_claude-sonnet-4-5-20250929_add-is-odd.log",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let serial = aggregate_pass_rates(
        &LogStore::new(StoreConfig::new(temp_dir.path()).with_concurrency(1)),
        &names,
    )
    .await;
    let parallel = aggregate_pass_rates(
        &LogStore::new(StoreConfig::new(temp_dir.path()).with_concurrency(8)),
        &names,
    )
    .await;
    assert_eq!(serial, parallel);
}
