//! Trajectory reconstruction from benchmark harness logs.
//!
//! The harness writes one free-form text log per run. This module rebuilds a
//! structured [`Trajectory`] from it: the tool-call steps of each iteration,
//! individual test outcomes, the final verdict, the run duration, embedded
//! agent/golden diffs and the lab training metrics block.
//!
//! # Overview
//!
//! Parsing is a single pass per concern over text already in memory:
//! - **Steps**: a line-by-line state machine over normalized lines
//!   ([`steps`])
//! - **Tests**: an independent scan tolerant of wrapped records
//!   ([`test_results`])
//! - **Outcome**: the last run summary line ([`outcome`])
//! - **Diffs** and **lab metrics**: pattern scans over the whole content
//!
//! Nothing here fails. Logs that match nothing produce an empty trajectory
//! with `final_success == false`.
//!
//! # Usage
//!
//! ```rust
//! use arena_trace::trajectory::parse;
//!
//! let log = "\
//! HARNESS: Iteration 1 - making LLM call
//! HARNESS: Tool call: read_file
//! Tool 0 result success: True
//! pass tests/test_app.py::test_ok: PASSED
//! Total tests: 1/1 passed
//! ";
//!
//! let trajectory = parse("openai_gpt-5_add-is-odd.log", log);
//! assert_eq!(trajectory.model_name, "GPT-5");
//! assert_eq!(trajectory.task_name, "Add Is Odd");
//! assert_eq!(trajectory.tool_calls, 1);
//! assert_eq!(trajectory.tests_passed, 1);
//! assert!(trajectory.final_success);
//! ```

pub mod diff;
pub mod filename;
pub mod lab_metrics;
pub mod normalize;
pub mod outcome;
pub mod parser;
pub mod steps;
pub mod test_results;
pub mod types;

// Re-export main types and entry points for convenience
pub use diff::extract_diffs;
pub use filename::{resolve as resolve_filename, FilenameMetadata};
pub use lab_metrics::extract_lab_metrics;
pub use normalize::{extract_timestamp, normalize_line};
pub use outcome::{final_success, run_duration};
pub use parser::parse;
pub use steps::{reconstruct, Reconstruction, StepReconstructor};
pub use test_results::extract_test_results;
pub use types::{
    DiffBundle, DiffStats, EditEntry, LabTrainingMetrics, Payload, StepKind, SyntaxErrorDetail,
    SyntaxValidation, TestResult, TestStatus, ToolDetails, Trajectory, TrajectoryStep,
};
