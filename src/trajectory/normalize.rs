//! Line normalization and timestamp extraction.
//!
//! Newer harness builds decorate progress lines with an emoji prefix
//! (`🔍 HARNESS: ...`). Stripping it lets the step rules match old and new
//! logs with the same substrings.

use std::sync::LazyLock;

use regex::Regex;

/// Sentinel returned when a line carries no timestamp.
pub const NO_TIMESTAMP: &str = "N/A";

/// Emoji prefixes the harness is known to print.
const DECORATION_GLYPHS: &[char] = &[
    '\u{1F50D}', // magnifier
    '\u{1F680}', // rocket
    '\u{1F4CA}', // bar chart
    '\u{1F3AF}', // target
    '\u{1F4DD}', // memo
    '\u{23F1}',  // stopwatch
    '\u{1F9EA}', // test tube
];

const VARIATION_SELECTOR: char = '\u{FE0F}';

static DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid datetime regex")
});

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}").expect("valid time regex"));

/// Removes any leading decoration glyphs (and the whitespace after them).
///
/// Idempotent: a normalized line has no decoration prefix left.
pub fn normalize_line(line: &str) -> &str {
    let mut rest = line.trim();
    loop {
        let Some(stripped) = rest.strip_prefix(DECORATION_GLYPHS) else {
            return rest;
        };
        rest = stripped
            .trim_start_matches(VARIATION_SELECTOR)
            .trim_start();
    }
}

/// Extracts the first timestamp in `line`, or [`NO_TIMESTAMP`].
///
/// A full `YYYY-MM-DD HH:MM:SS` wins over a bare `HH:MM:SS`.
pub fn extract_timestamp(line: &str) -> String {
    DATETIME
        .find(line)
        .or_else(|| TIME_OF_DAY.find(line))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NO_TIMESTAMP.to_string())
}
