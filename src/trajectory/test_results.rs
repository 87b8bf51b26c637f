//! Individual test outcome extraction.
//!
//! The grader prints one `pass|fail <path>::<test>: PASSED|FAILED` line per
//! test, but terminal wrapping and older harness builds split those records
//! across lines. Four shapes are recognised:
//!
//! 1. `pass tasks/a.py::test_x: PASSED` on one line (the `pass`/`fail`
//!    prefix is required; a bare `...: PASSED` only closes a split record)
//! 2. `tasks/a.py::test_x:` followed by a bare `PASSED` line
//! 3. a bare `pass` line, then up to [`LOOKAHEAD_LINES`] lines of
//!    `path::test` fragments ending in `...: PASSED`
//! 4. the same, ended by a bare `PASSED` line instead
//!
//! Blank lines are ignored throughout, so they never count against the
//! lookahead. Lines consumed by a multi-line record are not scanned again.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{TestResult, TestStatus};

/// How many lines after a bare `pass`/`fail` token may hold its record.
pub const LOOKAHEAD_LINES: usize = 3;

static SINGLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:pass|fail)\s+(\S.*::.+?):\s*(PASSED|FAILED)$")
        .expect("valid single-line test regex")
});

static DANGLING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:pass|fail)\s+)?(\S.*::.+):$").expect("valid dangling test regex")
});

static INLINE_TERMINATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*(PASSED|FAILED)\s*$").expect("valid terminator regex"));

fn is_status_token(line: &str) -> bool {
    line == "pass" || line == "fail"
}

/// Extracts every recognisable test outcome from `content`, in order.
pub fn extract_test_results(content: &str) -> Vec<TestResult> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut results = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = SINGLE_LINE.captures(line) {
            if let Some(result) = TestStatus::from_outcome(&caps[2])
                .and_then(|status| TestResult::from_full_name(&caps[1], status))
            {
                results.push(result);
                i += 1;
                continue;
            }
        }

        if let Some(caps) = DANGLING_NAME.captures(line) {
            let outcome = lines.get(i + 1).and_then(|next| TestStatus::from_outcome(next));
            if let Some(result) =
                outcome.and_then(|status| TestResult::from_full_name(&caps[1], status))
            {
                results.push(result);
                i += 2;
                continue;
            }
        }

        if is_status_token(line) {
            if let Some((result, last)) = split_record(&lines, i) {
                results.push(result);
                i = last + 1;
                continue;
            }
        }

        i += 1;
    }

    debug!(count = results.len(), "Extracted test results");
    results
}

/// Rebuilds a record that starts with a bare `pass`/`fail` at `start`.
///
/// Returns the result and the index of its terminating line.
fn split_record(lines: &[&str], start: usize) -> Option<(TestResult, usize)> {
    let mut fragments: Vec<&str> = Vec::new();
    let end = (start + LOOKAHEAD_LINES).min(lines.len().saturating_sub(1));

    for idx in start + 1..=end {
        let line = lines[idx];
        if is_status_token(line) {
            // The next record starts here; this one never finished.
            return None;
        }
        if let Some(status) = TestStatus::from_outcome(line) {
            return assemble(&fragments, status).map(|result| (result, idx));
        }
        if let Some(caps) = INLINE_TERMINATOR.captures(line) {
            let status = TestStatus::from_outcome(&caps[1])?;
            let head = caps.get(0).map(|m| &line[..m.start()]).unwrap_or(line);
            fragments.push(head);
            return assemble(&fragments, status).map(|result| (result, idx));
        }
        fragments.push(line);
    }
    None
}

fn assemble(fragments: &[&str], status: TestStatus) -> Option<TestResult> {
    let joined = fragments.concat();
    let joined = joined.trim().trim_end_matches(':');
    let joined = joined
        .strip_prefix("pass ")
        .or_else(|| joined.strip_prefix("fail "))
        .unwrap_or(joined);
    TestResult::from_full_name(joined, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(status: TestStatus) -> TestResult {
        TestResult {
            name: "test_x".to_string(),
            status,
            full_name: "tasks/a.py::test_x".to_string(),
        }
    }

    #[test]
    fn test_single_line_shape() {
        let results = extract_test_results("\tpass tasks/a.py::test_x: PASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);

        let results = extract_test_results("fail tasks/a.py::test_x: FAILED");
        assert_eq!(results, vec![expected(TestStatus::Fail)]);
    }

    #[test]
    fn test_unprefixed_outcome_line_is_not_a_record() {
        assert!(extract_test_results("tasks/a.py::test_x: PASSED\n").is_empty());
        assert!(extract_test_results("collected tasks/a.py::test_x: FAILED\n").is_empty());

        // Too far from its `pass` token to close the split record.
        let results = extract_test_results("pass\ntasks/\na.py\n::test\ntasks/a.py::test_x: PASSED\n");
        assert!(results.is_empty());
    }

    #[test]
    fn test_outcome_on_next_line() {
        let results = extract_test_results("pass tasks/a.py::test_x:\nPASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);

        let results = extract_test_results("tasks/a.py::test_x:\nFAILED\n");
        assert_eq!(results, vec![expected(TestStatus::Fail)]);
    }

    #[test]
    fn test_dangling_name_without_outcome_is_skipped() {
        let results = extract_test_results("tasks/a.py::test_x:\nsomething else\n");
        assert!(results.is_empty());
    }

    #[test]
    fn test_split_record_with_inline_terminator() {
        let results = extract_test_results("pass\ntasks/a.py::test_x: PASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);
    }

    #[test]
    fn test_split_record_across_fragments() {
        let results = extract_test_results("pass\ntasks/a.py::\ntest_x\nPASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);

        let results = extract_test_results("fail\ntasks/a.py\n::test_x: FAILED\n");
        assert_eq!(results, vec![expected(TestStatus::Fail)]);
    }

    #[test]
    fn test_split_record_beyond_lookahead_is_dropped() {
        let results = extract_test_results("pass\ntasks/\na.py\n::test\n_x: PASSED\n");
        assert!(results.is_empty());
    }

    #[test]
    fn test_split_record_aborts_on_next_token() {
        let results =
            extract_test_results("pass\ntasks/a.py::test_y\nfail\ntasks/a.py::test_x: FAILED\n");
        assert_eq!(results, vec![expected(TestStatus::Fail)]);
    }

    #[test]
    fn test_consumed_lines_are_not_rescanned() {
        // The terminator line on its own would also match the single-line shape.
        let results = extract_test_results("pass\npass tasks/a.py::test_x: PASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);
    }

    #[test]
    fn test_nested_names_and_duplicates() {
        let content = "\
pass tests/t.py::TestCls::test_a: PASSED
pass tests/t.py::TestCls::test_a: PASSED
fail tests/t.py::test_b: FAILED
";
        let results = extract_test_results(content);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].name, "TestCls::test_a");
        assert_eq!(results[0], results[1]);
        assert_eq!(results[2].status, TestStatus::Fail);
    }

    #[test]
    fn test_blank_lines_do_not_use_up_lookahead() {
        let results = extract_test_results("pass\n\n  \ntasks/a.py::\n\ntest_x\n\nPASSED\n");
        assert_eq!(results, vec![expected(TestStatus::Pass)]);
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let content = "\
Tests Passed: True
Passed 2/3 tests (66.7%)
pass
";
        assert!(extract_test_results(content).is_empty());
    }
}
