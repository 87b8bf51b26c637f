//! Agent/golden diff extraction from the grader's result dump.
//!
//! The grader prints its result dict with Python `repr`, so the diffs show up
//! as `'agent_diff': '<escaped text>'`. Only one level of `\'` escaping is
//! understood, which matches what the grader emits.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{DiffBundle, DiffStats};

static AGENT_DIFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'agent_diff':\s*'((?:\\'|[^'])*)'").expect("valid agent diff regex")
});

static GOLDEN_DIFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'golden_diff':\s*'((?:\\'|[^'])*)'").expect("valid golden diff regex")
});

static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^--- a/([^\r\n]+?)\s*\r?\n\+\+\+ b/").expect("valid file header regex")
});

/// Extracts the diff bundle, or `None` when the log embeds neither diff.
pub fn extract_diffs(content: &str) -> Option<DiffBundle> {
    let agent_diff = embedded(&AGENT_DIFF, content);
    let golden_diff = embedded(&GOLDEN_DIFF, content);
    if agent_diff.is_none() && golden_diff.is_none() {
        return None;
    }

    let files_changed = agent_diff
        .as_deref()
        .map(changed_files)
        .unwrap_or_default();

    let diff_stats = DiffStats {
        agent_files_changed: files_changed.len() as u32,
        golden_files_changed: u32::from(golden_diff.as_deref().is_some_and(|d| !d.is_empty())),
        agent_lines: agent_diff.as_deref().map(line_count).unwrap_or(0),
        golden_lines: golden_diff.as_deref().map(line_count).unwrap_or(0),
    };

    Some(DiffBundle {
        agent_diff,
        golden_diff,
        files_changed,
        diff_stats,
    })
}

fn embedded(pattern: &Regex, content: &str) -> Option<String> {
    pattern
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()))
}

/// Undoes the grader's escaping: `\'`, then `\n`, then `\t`.
pub fn unescape(text: &str) -> String {
    text.replace("\\'", "'")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

/// Files named by `--- a/<path>` / `+++ b/` header pairs, first occurrence order.
pub fn changed_files(diff: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for caps in FILE_HEADER.captures_iter(diff) {
        let path = caps[1].trim();
        if !path.is_empty() && !files.iter().any(|f| f == path) {
            files.push(path.to_string());
        }
    }
    files
}

/// Newline-split length; an empty diff still counts as one line.
fn line_count(text: &str) -> u32 {
    text.split('\n').count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_diff_unescapes_newlines() {
        let content = r"{'agent_diff': 'line1\nline2', 'score': 1.0}";
        let bundle = extract_diffs(content).expect("bundle");
        assert_eq!(bundle.agent_diff.as_deref(), Some("line1\nline2"));
        assert_eq!(bundle.diff_stats.agent_lines, 2);
        assert!(bundle.golden_diff.is_none());
        assert_eq!(bundle.diff_stats.golden_files_changed, 0);
        assert_eq!(bundle.diff_stats.golden_lines, 0);
    }

    #[test]
    fn test_escaped_quotes_stay_inside_value() {
        let content = r"{'agent_diff': 'print(\'hi\')\n', 'golden_diff': 'x'}";
        let bundle = extract_diffs(content).expect("bundle");
        assert_eq!(bundle.agent_diff.as_deref(), Some("print('hi')\n"));
        assert_eq!(bundle.golden_diff.as_deref(), Some("x"));
    }

    #[test]
    fn test_changed_files_dedup_in_order() {
        let content = r"{'agent_diff': 'diff --git a/src/b.py b/src/b.py\n--- a/src/b.py\n+++ b/src/b.py\n@@ -1 +1 @@\n-x\n+y\n--- a/src/a.py\n+++ b/src/a.py\n+z\n--- a/src/b.py\n+++ b/src/b.py\n+w', 'golden_diff': '--- a/src/a.py\n+++ b/src/a.py\n--- a/src/c.py\n+++ b/src/c.py\n'}";
        let bundle = extract_diffs(content).expect("bundle");
        assert_eq!(bundle.files_changed, vec!["src/b.py", "src/a.py"]);
        assert_eq!(bundle.diff_stats.agent_files_changed, 2);
        // Golden file count is a presence flag, not a count.
        assert_eq!(bundle.diff_stats.golden_files_changed, 1);
        assert_eq!(bundle.diff_stats.golden_lines, 5);
    }

    #[test]
    fn test_empty_diff_counts_one_line() {
        let bundle = extract_diffs("{'agent_diff': '', 'golden_diff': ''}").expect("bundle");
        assert_eq!(bundle.agent_diff.as_deref(), Some(""));
        assert_eq!(bundle.diff_stats.agent_lines, 1);
        assert_eq!(bundle.diff_stats.golden_lines, 1);
        assert_eq!(bundle.diff_stats.golden_files_changed, 0);
        assert!(bundle.files_changed.is_empty());
    }

    #[test]
    fn test_no_embedded_diffs() {
        assert!(extract_diffs("Total tests: 1/1 passed").is_none());
        assert!(extract_diffs("").is_none());
        // An unterminated value is not a diff.
        assert!(extract_diffs("{'agent_diff': 'never closed").is_none());
    }

    #[test]
    fn test_large_diff_is_kept_whole() {
        let hunk = r"--- a/big.txt\n+++ b/big.txt\n";
        let body = r"+filler line\n".repeat(20_000);
        let content = format!("{{'agent_diff': '{hunk}{body}'}}");
        let bundle = extract_diffs(&content).expect("bundle");
        assert_eq!(bundle.files_changed, vec!["big.txt"]);
        assert_eq!(bundle.diff_stats.agent_lines, 20_003);
    }

    #[test]
    fn test_unescape_order() {
        assert_eq!(unescape(r"a\'b\tc\nd"), "a'b\tc\nd");
    }
}
