//! Trajectory assembly: one log file in, one [`Trajectory`] out.

use tracing::debug;

use super::diff::extract_diffs;
use super::filename;
use super::lab_metrics::extract_lab_metrics;
use super::outcome::{final_success, run_duration};
use super::steps::reconstruct;
use super::test_results::extract_test_results;
use super::types::Trajectory;

/// Parses a harness log into a trajectory.
///
/// Total over all inputs: content that matches nothing yields a trajectory
/// with no steps, no tests and `final_success == false`. Parsing the same
/// bytes twice yields equal records.
pub fn parse(filename: &str, content: &str) -> Trajectory {
    let names = filename::resolve(filename);
    let mut trajectory = Trajectory::new(filename, names.model_name, names.task_name);

    let steps = reconstruct(content);
    if let Some(model) = steps.model_name {
        trajectory.model_name = model;
    }
    if let Some(task) = steps.task_name {
        trajectory.task_name = task;
    }
    trajectory.total_iterations = steps.total_iterations;
    trajectory.tool_calls = steps.tool_calls;
    trajectory.errors = steps.errors;
    trajectory.steps = steps.steps;

    trajectory.set_test_results(extract_test_results(content));
    trajectory.final_success = final_success(content);
    trajectory.duration = run_duration(content);
    trajectory.final_diffs = extract_diffs(content);
    trajectory.lab_training_metrics = extract_lab_metrics(content);

    debug!(
        filename,
        steps = trajectory.steps.len(),
        iterations = trajectory.total_iterations,
        tests = trajectory.total_tests,
        success = trajectory.final_success,
        "Parsed trajectory"
    );
    trajectory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::types::{StepKind, TestStatus};

    const SAMPLE_LOG: &str = "\
🚀 Starting benchmark run at 2025-01-01 09:00:00
Dataset: datasets/logwatch-rotate, Agent: harness, Model: anthropic/claude-sonnet-4-5-20250929
Task: 001
------------------------------------------------------------
🔍 HARNESS: Iteration 1 - making LLM call
🔍 HARNESS: Tool call: read_file
Tool 0 result success: True
def main():
    pass
🔍 HARNESS: Iteration 2 - making LLM call
🔍 HARNESS: Tool call: edit_file
🔍 HARNESS: Edit target: main.py
Tool 0 result success: False
SyntaxError: invalid syntax
  line 3
TASK 001:\tSuccess.\t Passed 2/2 tests (100.0%)
\t-- Lab Training Metrics --
\tTests Passed: True
\t-- Details --
\tpass tests/test_main.py::test_is_odd: PASSED
\tpass tests/test_main.py::test_output: PASSED
{'agent_diff': '--- a/main.py\\n+++ b/main.py\\n+x = 1', 'golden_diff': '--- a/main.py\\n+++ b/main.py'}
------------------------------------------------------------
Benchmark run completed at 2025-01-01 09:03:10
Total duration: 3m 10s
Overall result: Success
Total tests: 2/2 passed
";

    #[test]
    fn test_parse_sample_log() {
        let trajectory = parse(
            "anthropic_claude-sonnet-4-5-20250929_logwatch-rotate.log",
            SAMPLE_LOG,
        );
        assert_eq!(
            trajectory.model_name,
            "anthropic/claude-sonnet-4-5-20250929"
        );
        assert_eq!(trajectory.task_name, "Logwatch Rotate");
        assert_eq!(trajectory.total_iterations, 2);
        assert_eq!(trajectory.tool_calls, 2);
        assert_eq!(trajectory.errors, 1);
        assert!(trajectory.final_success);
        assert_eq!(trajectory.duration.as_deref(), Some("3m 10s"));

        assert_eq!(trajectory.steps.len(), 3);
        assert_eq!(trajectory.steps[0].kind, StepKind::Start);
        assert_eq!(trajectory.steps[0].timestamp.as_deref(), Some("2025-01-01 09:00:00"));
        assert_eq!(trajectory.steps[2].tool_details.edit_target.as_deref(), Some("main.py"));
        assert_eq!(trajectory.steps[2].success, Some(false));
        assert_eq!(trajectory.steps[2].tool_result[0], "SyntaxError: invalid syntax");

        assert_eq!(trajectory.total_tests, 2);
        assert_eq!(trajectory.tests_passed, 2);
        assert!(trajectory
            .test_results
            .iter()
            .all(|t| t.status == TestStatus::Pass));

        let diffs = trajectory.final_diffs.as_ref().expect("diffs");
        assert_eq!(diffs.files_changed, vec!["main.py"]);
        assert_eq!(diffs.diff_stats.agent_lines, 3);

        let metrics = trajectory.lab_training_metrics.as_ref().expect("metrics");
        assert_eq!(metrics.tests_passed, Some(true));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let name = "openai_gpt-5_task.log";
        let first = serde_json::to_string(&parse(name, SAMPLE_LOG)).expect("json");
        let second = serde_json::to_string(&parse(name, SAMPLE_LOG)).expect("json");
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_garbage_is_total() {
        for content in ["", "\n\n\n", "random text\nwithout structure", "\u{0}\u{1}binary"] {
            let trajectory = parse("foo.log", content);
            assert_eq!(trajectory.model_name, "Unknown");
            assert!(!trajectory.task_name.is_empty());
            assert!(trajectory.steps.is_empty());
            assert!(trajectory.test_results.is_empty());
            assert!(!trajectory.final_success);
            assert!(trajectory.final_diffs.is_none());
            assert!(trajectory.lab_training_metrics.is_none());
        }
    }
}
