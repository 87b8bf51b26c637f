//! Final verdict and run duration from the harness summary lines.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

static TOTAL_TESTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)total\s+tests:\s*(\d+)\s*/\s*(\d+)\s+passed").expect("valid total regex")
});

static PASSED_TESTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)passed\s+(\d+)\s*/\s*(\d+)\s+tests").expect("valid passed regex")
});

static TOTAL_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Total duration:[ \t]*(\S[^\r\n]*?)[ \t]*\r?$").expect("valid duration regex")
});

static RUN_STARTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Starting benchmark run at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})")
        .expect("valid start regex")
});

static RUN_COMPLETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Benchmark run completed at (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})")
        .expect("valid completion regex")
});

const HARNESS_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A `passed/total` pair read from a summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestTally {
    pub passed: u64,
    pub total: u64,
}

impl TestTally {
    /// A run succeeded when every test passed and there was at least one.
    pub fn is_success(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}

/// Last `Total tests: X/Y passed`, else last `Passed X/Y tests`.
pub fn final_tally(content: &str) -> Option<TestTally> {
    last_tally(&TOTAL_TESTS, content).or_else(|| last_tally(&PASSED_TESTS, content))
}

/// Whether the run counts as a success. False when no summary line exists.
pub fn final_success(content: &str) -> bool {
    final_tally(content).is_some_and(|tally| tally.is_success())
}

fn last_tally(pattern: &Regex, content: &str) -> Option<TestTally> {
    pattern
        .captures_iter(content)
        .filter_map(|caps| {
            let passed = caps.get(1)?.as_str().parse().ok()?;
            let total = caps.get(2)?.as_str().parse().ok()?;
            Some(TestTally { passed, total })
        })
        .last()
}

/// Run duration: the last `Total duration:` value verbatim, or the span between
/// the start and completion timestamps formatted as `"<m>m <s>s"`.
pub fn run_duration(content: &str) -> Option<String> {
    if let Some(caps) = TOTAL_DURATION.captures_iter(content).last() {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let started = RUN_STARTED
        .captures(content)
        .and_then(|caps| parse_harness_time(&caps[1]))?;
    let completed = RUN_COMPLETED
        .captures_iter(content)
        .last()
        .and_then(|caps| parse_harness_time(&caps[1]))?;
    let seconds = (completed - started).num_seconds();
    if seconds < 0 {
        return None;
    }
    Some(format!("{}m {}s", seconds / 60, seconds % 60))
}

fn parse_harness_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, HARNESS_TIME_FORMAT).ok()
}
