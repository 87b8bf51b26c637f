//! Model and task resolution from log filenames.
//!
//! The harness names its logs `<provider>_<model>_<task>.log`, but older runs
//! and hand-renamed files do not always follow that. Resolution tries the
//! known model table first and then a short list of generic shapes.
//!
//! Display names and grouping keys come out of the same [`resolve`] call so
//! that the dashboard and the task-id grouping always agree on which segment
//! of a filename is the task.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Model name used when nothing in the filename looks like a model.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// Known model ids as they appear in log filenames, with display names.
///
/// Order matters: the first entry found anywhere in the filename wins, so
/// longer ids must come before their prefixes (`gpt-4o-mini` before `gpt-4o`).
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("claude-sonnet-4-5-20250929", "Claude Sonnet 4.5"),
    ("claude-opus-4-1-20250805", "Claude Opus 4.1"),
    ("claude-sonnet-4-20250514", "Claude Sonnet 4"),
    ("claude-opus-4-20250514", "Claude Opus 4"),
    ("claude-3-7-sonnet-20250219", "Claude 3.7 Sonnet"),
    ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet"),
    ("claude-3-5-haiku-20241022", "Claude 3.5 Haiku"),
    ("claude-3-opus-20240229", "Claude 3 Opus"),
    ("gemini_gemini-2.5-pro", "Gemini 2.5 Pro"),
    ("gemini_gemini-2.5-flash", "Gemini 2.5 Flash"),
    ("gemini_gemini-1.5-flash", "Gemini 1.5 Flash"),
    ("gpt-4o-2024-08-06", "GPT-4o (2024-08-06)"),
    ("gpt-4o-2024-05-13", "GPT-4o (2024-05-13)"),
    ("gpt-4o-mini", "GPT-4o Mini"),
    ("gpt-4o", "GPT-4o"),
    ("gpt-5-mini", "GPT-5 Mini"),
    ("gpt-5", "GPT-5"),
];

/// Generic `model`/`task` shapes, tried in order when no known id matches.
static FALLBACK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // model-task.ext
        r"^([A-Za-z][A-Za-z0-9.]*)-(.+)\.(?:log|txt)$",
        // model_task, task being the last underscore segment
        r"^(.+)_([^_]+)$",
        // first-segment_rest
        r"^([^_]+)_(.+)$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid filename pattern"))
    .collect()
});

static MODEL_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("valid identifier regex")
});

/// Everything the filename says about a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilenameMetadata {
    /// Display model name ("Claude Sonnet 4.5", "Openai O3", "Unknown").
    pub model_name: String,
    /// Model segment exactly as it appears in the filename (empty if unknown).
    pub model_id: String,
    /// Display task name ("Add Is Odd").
    pub task_name: String,
    /// Raw task fragment, stable across display changes ("add-is-odd").
    pub task_id: String,
}

/// Resolves model and task from a log filename. Never fails.
pub fn resolve(filename: &str) -> FilenameMetadata {
    let (model_id, model_name, task_fragment) = split_model(filename);
    let mut task_id = clean_task_fragment(task_fragment);
    if task_id.is_empty() {
        task_id = clean_task_fragment(filename);
    }
    if task_id.is_empty() {
        task_id = filename.trim().to_string();
    }
    let mut task_name = title_case(&task_id);
    if task_name.is_empty() {
        task_name = UNKNOWN_MODEL.to_string();
    }

    FilenameMetadata {
        model_name,
        model_id,
        task_name,
        task_id,
    }
}

/// Display model and task names for a filename.
pub fn model_and_task(filename: &str) -> (String, String) {
    let meta = resolve(filename);
    (meta.model_name, meta.task_name)
}

/// Raw task identifier used as a grouping key.
pub fn task_id(filename: &str) -> String {
    resolve(filename).task_id
}

/// Splits off the model: returns (raw id, display name, task remainder).
fn split_model(filename: &str) -> (String, String, &str) {
    for (id, display) in KNOWN_MODELS {
        if let Some(pos) = filename.find(id) {
            return (
                (*id).to_string(),
                (*display).to_string(),
                &filename[pos + id.len()..],
            );
        }
    }

    for pattern in FALLBACK_PATTERNS.iter() {
        let Some(caps) = pattern.captures(filename) else {
            continue;
        };
        let (Some(model), Some(task)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if MODEL_IDENTIFIER.is_match(model.as_str()) {
            return (
                model.as_str().to_string(),
                title_case(model.as_str()),
                task.as_str(),
            );
        }
    }

    (String::new(), UNKNOWN_MODEL.to_string(), filename)
}

/// Strips leading separators and a trailing `.log`/`.txt` from a task fragment.
fn clean_task_fragment(fragment: &str) -> String {
    let fragment = fragment.trim();
    let fragment = fragment
        .strip_suffix(".log")
        .or_else(|| fragment.strip_suffix(".txt"))
        .unwrap_or(fragment);
    fragment
        .trim_start_matches(|c: char| c == '_' || c == '-' || c == '.')
        .to_string()
}

/// Converts `_`/`-` to spaces and capitalizes each word.
fn title_case(text: &str) -> String {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
