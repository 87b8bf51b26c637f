//! Step reconstruction from harness progress lines.
//!
//! The harness prints loosely formatted progress text: iteration banners,
//! tool-call announcements, `HARNESS:` detail lines and tool output. The
//! [`StepReconstructor`] walks those lines once, in order, and rebuilds the
//! step sequence.
//!
//! # Rules
//!
//! Each line is normalized and checked against [`RULES`] top to bottom. The
//! first rule whose guard matches *and* whose handler accepts the line
//! consumes it. At most one rule consumes a line. Iteration, tool call and
//! tool result lines with an unreadable capture (a missing iteration number,
//! say) are still consumed, leaving state untouched. Only `HARNESS:` detail
//! lines that match no known form decline and fall through.
//!
//! | # | rule             | fires on                                          |
//! |---|------------------|---------------------------------------------------|
//! | 1 | `run_start`      | `Starting benchmark run`                          |
//! | 2 | `run_header`     | `Dataset:` + `Agent:` + `Model:`                  |
//! | 3 | `iteration`      | `HARNESS: Iteration N ... making LLM call`        |
//! | 4 | `tool_call`      | `HARNESS: Tool call` with an active iteration     |
//! | 5 | `tool_detail`    | `HARNESS:` detail lines while a step is open      |
//! | 6 | `tool_result`    | `Tool 0 result success: <bool>`                   |
//! | 7 | `result_output`  | any line after a tool result verdict              |
//! | 8 | `error_line`     | `error` (any case) while the open step has none   |

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::normalize::{extract_timestamp, normalize_line};
use super::types::{
    EditEntry, Payload, SyntaxErrorDetail, SyntaxValidation, ToolDetails, TrajectoryStep,
};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static START_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}:\d{2})?").expect("valid start date regex")
});

static ITERATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"HARNESS: Iteration\s+(\d+)").expect("valid iteration regex")
});

static TOOL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"HARNESS: Tool call(?:\s+[\d/]+)?\s*[:\-]?\s*([A-Za-z_][\w.\-]*)")
        .expect("valid tool call regex")
});

static TOOL_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Tool 0 result success:\s*(true|false)\b").expect("valid tool result regex")
});

static EDIT_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Edit target:\s*(.+)$").expect("valid edit target regex")
});

static EDIT_INSTRUCTIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Edit instructions:\s*(.+)$")
        .expect("valid edit instructions regex")
});

static LINE_EDITS_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*(?:Line edits count:\s*(\d+)|Applying\s+(\d+)\s+line edits?)")
        .expect("valid line edits regex")
});

static EDIT_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*(?:Line\s+)?Edit\s+#?(\d+):\s*(.*)$").expect("valid edit regex")
});

static SYNTAX_VALIDATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Syntax validation\s+(passed|failed)(?:\s*[:\-]\s*(.*))?$")
        .expect("valid syntax validation regex")
});

static SYNTAX_ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Syntax error (?:at|on) line\s+(\d+)\s*[:\-]?\s*(.*)$")
        .expect("valid syntax error regex")
});

static CHANGES_NOT_APPLIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Changes not applied:\s*(.*)$").expect("valid regex")
});

static CHANGES_APPLIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Changes applied:\s*(.*)$").expect("valid regex")
});

static ATTEMPTED_CHANGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Attempted changes:\s*(.*)$").expect("valid regex")
});

static WRITING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)HARNESS:\s*Writing\s+(\d+)\s+characters\s+to\s+(.+)$")
        .expect("valid writing regex")
});

static GENERIC_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"HARNESS:\s*([A-Za-z][A-Za-z0-9 _\-]*?)\s*:\s*(.*)$")
        .expect("valid detail regex")
});

/// `HARNESS:` phrases owned by other rules; never stored as generic details.
const RESERVED_PHRASES: &[&str] = &["Iteration", "Tool call", "result success"];

/// Keys with a typed field in [`ToolDetails`].
const TYPED_DETAIL_KEYS: &[&str] = &[
    "editTarget",
    "editInstructions",
    "lineEditsCount",
    "edits",
    "syntaxValidation",
    "syntaxError",
    "syntaxErrorDetail",
    "changesApplied",
    "changesNotApplied",
    "attemptedChanges",
    "bytesWritten",
    "filePath",
];

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// Result of running a rule handler on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Applied {
    Consumed,
    Declined,
}

/// A line as seen by the rules.
struct Line<'a> {
    /// Trimmed, un-normalized text (timestamps are read from here).
    raw: &'a str,
    /// Normalized text (classification and stored content).
    text: &'a str,
}

/// One classification rule: a cheap guard plus a handler that may decline.
pub struct Rule {
    pub name: &'static str,
    guard: fn(&StepReconstructor, &str) -> bool,
    apply: fn(&mut StepReconstructor, &Line<'_>) -> Applied,
}

/// Classification rules in precedence order.
pub static RULES: &[Rule] = &[
    Rule {
        name: "run_start",
        guard: |_, text| text.contains("Starting benchmark run"),
        apply: StepReconstructor::apply_run_start,
    },
    Rule {
        name: "run_header",
        guard: |_, text| {
            text.contains("Dataset:") && text.contains("Agent:") && text.contains("Model:")
        },
        apply: StepReconstructor::apply_run_header,
    },
    Rule {
        name: "iteration",
        guard: |_, text| text.contains("HARNESS: Iteration") && text.contains("making LLM call"),
        apply: StepReconstructor::apply_iteration,
    },
    Rule {
        name: "tool_call",
        guard: |state, text| {
            state.current_iteration.is_some() && text.contains("HARNESS: Tool call")
        },
        apply: StepReconstructor::apply_tool_call,
    },
    Rule {
        name: "tool_detail",
        guard: |state, text| state.current.is_some() && text.contains("HARNESS:"),
        apply: StepReconstructor::apply_tool_detail,
    },
    Rule {
        name: "tool_result",
        guard: |state, text| state.current.is_some() && text.contains("Tool 0 result success:"),
        apply: StepReconstructor::apply_tool_result,
    },
    Rule {
        name: "result_output",
        guard: |state, _| state.collecting && state.current.is_some(),
        apply: StepReconstructor::apply_result_output,
    },
    Rule {
        name: "error_line",
        guard: |state, text| {
            state
                .current_step()
                .is_some_and(|step| step.error.is_none())
                && text.to_ascii_lowercase().contains("error")
        },
        apply: StepReconstructor::apply_error_line,
    },
];

// ---------------------------------------------------------------------------
// Reconstructor
// ---------------------------------------------------------------------------

/// What the reconstructor recovered from a whole log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub steps: Vec<TrajectoryStep>,
    pub total_iterations: u32,
    pub tool_calls: u32,
    pub errors: u32,
    /// Model named by the run header line, if any.
    pub model_name: Option<String>,
    /// Task named by the run header line, if any.
    pub task_name: Option<String>,
}

/// Single-pass state machine over log lines.
///
/// States: idle (no open step), in-step, and collecting-result (an open step
/// whose tool result verdict has been seen). Steps are appended once and only
/// the most recent one is ever mutated.
#[derive(Debug, Default)]
pub struct StepReconstructor {
    steps: Vec<TrajectoryStep>,
    /// Index of the open step in `steps`.
    current: Option<usize>,
    current_iteration: Option<u32>,
    total_iterations: u32,
    tool_calls: u32,
    errors: u32,
    collecting: bool,
    model_name: Option<String>,
    task_name: Option<String>,
}

impl StepReconstructor {
    /// Creates an idle reconstructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies one raw line, returning the name of the rule that consumed it.
    pub fn feed(&mut self, raw: &str) -> Option<&'static str> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let line = Line {
            raw,
            text: normalize_line(raw),
        };
        if line.text.is_empty() {
            return None;
        }

        for rule in RULES {
            if (rule.guard)(self, line.text) && (rule.apply)(self, &line) == Applied::Consumed {
                return Some(rule.name);
            }
        }
        None
    }

    /// Ends the pass. The last step stays as accumulated.
    pub fn finish(self) -> Reconstruction {
        Reconstruction {
            steps: self.steps,
            total_iterations: self.total_iterations,
            tool_calls: self.tool_calls,
            errors: self.errors,
            model_name: self.model_name,
            task_name: self.task_name,
        }
    }

    fn current_step(&self) -> Option<&TrajectoryStep> {
        self.current.and_then(|idx| self.steps.get(idx))
    }

    fn current_step_mut(&mut self) -> Option<&mut TrajectoryStep> {
        self.current.and_then(|idx| self.steps.get_mut(idx))
    }

    fn current_details(&mut self) -> Option<&mut ToolDetails> {
        self.current_step_mut().map(|step| &mut step.tool_details)
    }

    // -- rule handlers ------------------------------------------------------

    fn apply_run_start(&mut self, line: &Line<'_>) -> Applied {
        let timestamp = START_DATE
            .find(line.raw)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| extract_timestamp(line.raw));
        self.steps
            .push(TrajectoryStep::start(line.text, timestamp));
        Applied::Consumed
    }

    fn apply_run_header(&mut self, line: &Line<'_>) -> Applied {
        for segment in line.text.split(',') {
            if let Some(value) = value_after(segment, "Model:") {
                self.model_name = Some(value);
            } else if let Some(value) = value_after(segment, "Task:") {
                self.task_name = Some(value);
            }
        }
        Applied::Consumed
    }

    fn apply_iteration(&mut self, line: &Line<'_>) -> Applied {
        // A banner without a usable number is still a banner: no state change.
        let Some(iteration) = ITERATION
            .captures(line.text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        else {
            return Applied::Consumed;
        };
        self.current_iteration = Some(iteration);
        self.total_iterations = self.total_iterations.max(iteration);
        Applied::Consumed
    }

    fn apply_tool_call(&mut self, line: &Line<'_>) -> Applied {
        let Some(tool) = TOOL_CALL
            .captures(line.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        else {
            return Applied::Consumed;
        };
        let Some(iteration) = self.current_iteration else {
            return Applied::Consumed;
        };

        self.tool_calls += 1;
        debug!(iteration, tool = %tool, "Reconstructed tool call step");
        self.steps.push(TrajectoryStep::tool_call(
            iteration,
            tool,
            extract_timestamp(line.raw),
        ));
        self.current = Some(self.steps.len() - 1);
        self.collecting = false;
        Applied::Consumed
    }

    fn apply_tool_detail(&mut self, line: &Line<'_>) -> Applied {
        let collecting = self.collecting;
        let Some(details) = self.current_details() else {
            return Applied::Declined;
        };
        if apply_known_detail(details, line.text) {
            return Applied::Consumed;
        }
        // After a verdict, unrecognised HARNESS lines belong to the tool output.
        if !collecting && apply_generic_detail(details, line.text) {
            return Applied::Consumed;
        }
        Applied::Declined
    }

    fn apply_tool_result(&mut self, line: &Line<'_>) -> Applied {
        let Some(success) = TOOL_RESULT
            .captures(line.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().eq_ignore_ascii_case("true"))
        else {
            return Applied::Consumed;
        };
        let Some(step) = self.current_step_mut() else {
            return Applied::Declined;
        };
        step.success = Some(success);
        step.tool_result.clear();
        if !success {
            self.errors += 1;
        }
        self.collecting = true;
        Applied::Consumed
    }

    /// Output lines go straight onto the open step; it owns the buffer.
    fn apply_result_output(&mut self, line: &Line<'_>) -> Applied {
        match self.current_step_mut() {
            Some(step) => {
                step.tool_result.push(line.text.to_string());
                Applied::Consumed
            }
            None => Applied::Declined,
        }
    }

    fn apply_error_line(&mut self, line: &Line<'_>) -> Applied {
        let Some(step) = self.current_step_mut() else {
            return Applied::Declined;
        };
        if step.error.is_some() {
            return Applied::Declined;
        }
        step.error = Some(line.text.to_string());
        self.errors += 1;
        Applied::Consumed
    }
}

/// Runs the reconstructor over every line of `content`.
pub fn reconstruct(content: &str) -> Reconstruction {
    let mut reconstructor = StepReconstructor::new();
    for line in content.lines() {
        reconstructor.feed(line);
    }
    reconstructor.finish()
}

// ---------------------------------------------------------------------------
// HARNESS detail lines
// ---------------------------------------------------------------------------

/// Applies one of the typed detail lines. Returns false if none matched.
fn apply_known_detail(details: &mut ToolDetails, text: &str) -> bool {
    if let Some(caps) = EDIT_TARGET.captures(text) {
        details.edit_target = Some(caps[1].trim().to_string());
        return true;
    }
    if let Some(caps) = EDIT_INSTRUCTIONS.captures(text) {
        details.edit_instructions = Some(caps[1].trim().to_string());
        return true;
    }
    if let Some(caps) = LINE_EDITS_COUNT.captures(text) {
        let count = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse::<u32>().ok());
        if let Some(count) = count {
            details.line_edits_count = Some(count);
            return true;
        }
        return false;
    }
    if let Some(caps) = EDIT_ENTRY.captures(text) {
        let Ok(index) = caps[1].parse::<u32>() else {
            return false;
        };
        details.edits.push(EditEntry {
            index,
            description: caps[2].trim().to_string(),
        });
        return true;
    }
    if let Some(caps) = SYNTAX_VALIDATION.captures(text) {
        let passed = caps[1].eq_ignore_ascii_case("passed");
        let message = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|m| !m.is_empty());
        if !passed {
            if let Some(message) = &message {
                details.syntax_error = Some(message.clone());
            }
        }
        details.syntax_validation = Some(SyntaxValidation { passed, message });
        return true;
    }
    if let Some(caps) = SYNTAX_ERROR_LINE.captures(text) {
        let Ok(line) = caps[1].parse::<u32>() else {
            return false;
        };
        details.syntax_error_detail = Some(SyntaxErrorDetail {
            line,
            message: caps[2].trim().to_string(),
        });
        return true;
    }
    if let Some(caps) = CHANGES_NOT_APPLIED.captures(text) {
        details.changes_not_applied = Some(Payload::parse(&caps[1]));
        return true;
    }
    if let Some(caps) = CHANGES_APPLIED.captures(text) {
        details.changes_applied = Some(Payload::parse(&caps[1]));
        return true;
    }
    if let Some(caps) = ATTEMPTED_CHANGES.captures(text) {
        details.attempted_changes = Some(Payload::parse(&caps[1]));
        return true;
    }
    if let Some(caps) = WRITING.captures(text) {
        let Ok(bytes) = caps[1].parse::<u64>() else {
            return false;
        };
        details.bytes_written = Some(bytes);
        details.file_path = Some(caps[2].trim().to_string());
        return true;
    }
    false
}

/// Stores an unrecognised `HARNESS: Key: value` line under a camelCase key.
fn apply_generic_detail(details: &mut ToolDetails, text: &str) -> bool {
    if RESERVED_PHRASES.iter().any(|phrase| text.contains(phrase))
        || text.to_ascii_lowercase().contains("error")
    {
        return false;
    }
    let Some(caps) = GENERIC_DETAIL.captures(text) else {
        return false;
    };
    let key = camel_case_key(&caps[1]);
    if key.is_empty() || TYPED_DETAIL_KEYS.contains(&key.as_str()) {
        return false;
    }
    details.extra.insert(key, caps[2].trim().to_string());
    true
}

/// "Retry count" -> "retryCount".
fn camel_case_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for (i, word) in label
        .split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                key.extend(first.to_lowercase());
            } else {
                key.extend(first.to_uppercase());
            }
            key.push_str(&chars.as_str().to_lowercase());
        }
    }
    key
}

/// Non-empty text after `label` in `segment`.
fn value_after(segment: &str, label: &str) -> Option<String> {
    let (_, value) = segment.split_once(label)?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
