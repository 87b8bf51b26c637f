//! Trajectory data types reconstructed from harness logs.
//!
//! These records are what the parser hands to consumers (dashboards, the CLI,
//! aggregate reports). Field names serialize in camelCase so the JSON shape
//! stays stable for existing viewers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete trajectory reconstructed from one benchmark log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    /// Log filename the trajectory was parsed from.
    pub filename: String,

    /// Display task name (filename-derived unless the log names one).
    pub task_name: String,

    /// Display model name (filename-derived unless the log names one).
    pub model_name: String,

    /// Highest iteration index announced by the harness.
    pub total_iterations: u32,

    /// Number of tool calls recognised.
    pub tool_calls: u32,

    /// Failed tool results plus error lines attached to steps.
    pub errors: u32,

    /// Number of passing entries in `test_results`.
    pub tests_passed: u32,

    /// Number of entries in `test_results`.
    pub total_tests: u32,

    /// Final verdict taken from the run summary lines.
    pub final_success: bool,

    /// Run duration as printed by the harness (e.g. "3m 12s").
    pub duration: Option<String>,

    /// Ordered steps, in file order.
    pub steps: Vec<TrajectoryStep>,

    /// Embedded agent/golden diffs, if the log carries any.
    pub final_diffs: Option<DiffBundle>,

    /// Individual test outcomes, in discovery order.
    pub test_results: Vec<TestResult>,

    /// Lab training metrics block, if present.
    pub lab_training_metrics: Option<LabTrainingMetrics>,
}

impl Trajectory {
    /// Creates an empty trajectory for the given file and resolved names.
    pub fn new(
        filename: impl Into<String>,
        model_name: impl Into<String>,
        task_name: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            task_name: task_name.into(),
            model_name: model_name.into(),
            total_iterations: 0,
            tool_calls: 0,
            errors: 0,
            tests_passed: 0,
            total_tests: 0,
            final_success: false,
            duration: None,
            steps: Vec::new(),
            final_diffs: None,
            test_results: Vec::new(),
            lab_training_metrics: None,
        }
    }

    /// Replaces the test results and recomputes the derived counters.
    pub fn set_test_results(&mut self, results: Vec<TestResult>) {
        self.tests_passed = results
            .iter()
            .filter(|r| r.status == TestStatus::Pass)
            .count() as u32;
        self.total_tests = results.len() as u32;
        self.test_results = results;
    }
}

/// Kind of a trajectory step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The "Starting benchmark run" marker.
    Start,
    /// A tool call made during an iteration.
    Iteration,
}

/// One tool invocation (or the run start marker) and what the log says about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryStep {
    /// Step kind.
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Short human-readable description.
    pub content: String,

    /// Iteration the step belongs to (0 for the start marker).
    pub iteration: u32,

    /// Tool result verdict, once the harness reports it.
    pub success: Option<bool>,

    /// Timestamp text, or "N/A" when the line carries none.
    pub timestamp: Option<String>,

    /// Tool name for iteration steps.
    pub tool_call: Option<String>,

    /// First error line seen while the step was open.
    pub error: Option<String>,

    /// Structured details from `HARNESS:` sub-lines.
    pub tool_details: ToolDetails,

    /// Lines printed after the tool result verdict.
    pub tool_result: Vec<String>,
}

impl TrajectoryStep {
    /// Creates the run start marker step.
    pub fn start(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Start,
            content: content.into(),
            iteration: 0,
            success: Some(true),
            timestamp: Some(timestamp.into()),
            tool_call: None,
            error: None,
            tool_details: ToolDetails::default(),
            tool_result: Vec::new(),
        }
    }

    /// Creates an open tool-call step for the given iteration.
    pub fn tool_call(iteration: u32, tool: impl Into<String>, timestamp: impl Into<String>) -> Self {
        let tool = tool.into();
        Self {
            kind: StepKind::Iteration,
            content: format!("Executing {}", tool),
            iteration,
            success: None,
            timestamp: Some(timestamp.into()),
            tool_call: Some(tool),
            error: None,
            tool_details: ToolDetails::default(),
            tool_result: Vec::new(),
        }
    }
}

/// Structured fields attached to a step by harness sub-lines.
///
/// Known keys are typed; anything else a newer harness prints as
/// `HARNESS: Key: value` lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_instructions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_edits_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<EditEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_validation: Option<SyntaxValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax_error_detail: Option<SyntaxErrorDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_applied: Option<Payload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes_not_applied: Option<Payload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempted_changes: Option<Payload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_written: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,

    /// Unrecognised `HARNESS: Key: value` pairs.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// One indexed edit entry announced by the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEntry {
    pub index: u32,
    pub description: String,
}

/// Outcome of the harness syntax check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxValidation {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Line-level syntax error location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxErrorDetail {
    pub line: u32,
    pub message: String,
}

/// A payload that was JSON when the harness printed it, or raw text otherwise.
///
/// `Json` never holds a JSON string: a quoted string literal decodes to
/// `Raw`. That keeps the untagged form unambiguous, so a JSON string always
/// deserializes back to `Raw` and any other value to `Json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(serde_json::Value),
    Raw(String),
}

impl Payload {
    /// Decodes `text` as JSON, keeping the raw string when it does not parse.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) => Self::from_value(value),
            Err(_) => Payload::Raw(trimmed.to_string()),
        }
    }

    fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Payload::Raw(text),
            other => Payload::Json(other),
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Pass/fail status of an individual test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pass,
    Fail,
}

impl TestStatus {
    /// Maps a `PASSED`/`FAILED` outcome word.
    pub fn from_outcome(word: &str) -> Option<Self> {
        match word {
            "PASSED" => Some(Self::Pass),
            "FAILED" => Some(Self::Fail),
            _ => None,
        }
    }
}

/// A single test outcome printed by the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Test name (everything after the first `::`).
    pub name: String,
    pub status: TestStatus,
    /// `path::name`.
    pub full_name: String,
}

impl TestResult {
    /// Builds a result from a `path::name` string. Returns `None` without a `::`.
    pub fn from_full_name(full_name: &str, status: TestStatus) -> Option<Self> {
        let full_name = full_name.trim();
        let (path, name) = full_name.split_once("::")?;
        if path.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            status,
            full_name: full_name.to_string(),
        })
    }
}

/// Agent and golden diffs embedded in the grader output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffBundle {
    pub agent_diff: Option<String>,
    pub golden_diff: Option<String>,
    /// Files touched by the agent diff, first occurrence order.
    pub files_changed: Vec<String>,
    pub diff_stats: DiffStats,
}

/// Summary counters for a [`DiffBundle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub agent_files_changed: u32,
    /// 1 when any golden diff text exists, else 0.
    pub golden_files_changed: u32,
    pub agent_lines: u32,
    pub golden_lines: u32,
}

/// Fields printed under the "-- Lab Training Metrics --" header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTrainingMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests_passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_changes_made: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_syntax_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub successful_edits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_code_files: Option<u32>,
}
