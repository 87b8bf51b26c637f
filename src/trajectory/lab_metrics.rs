//! The "-- Lab Training Metrics --" block printed after each graded task.

use super::types::LabTrainingMetrics;

const METRICS_MARKER: &str = "-- Lab Training Metrics --";
const DETAILS_MARKER: &str = "-- Details --";

/// Lines scanned after the marker.
pub const METRICS_WINDOW: usize = 20;

/// Reads the first metrics block. `None` when the marker never appears.
///
/// Scanning stops at the "-- Details --" marker, so only fields printed
/// before it are picked up. Missing fields stay `None`.
pub fn extract_lab_metrics(content: &str) -> Option<LabTrainingMetrics> {
    let mut lines = content.lines().map(str::trim);
    lines.find(|line| line.contains(METRICS_MARKER))?;

    let mut metrics = LabTrainingMetrics::default();
    for line in lines.take(METRICS_WINDOW) {
        if line.contains(DETAILS_MARKER) {
            break;
        }
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match label.trim() {
            "Tests Passed" => metrics.tests_passed = Some(value.contains("True")),
            "Agent Success" => metrics.agent_success = Some(value.contains("True")),
            "Code Changes Made" => metrics.code_changes_made = Some(value.contains("True")),
            "No Syntax Errors" => metrics.no_syntax_errors = Some(value.contains("True")),
            "Conversation Length" => metrics.conversation_length = leading_int(value),
            "Successful Edits" => metrics.successful_edits = leading_int(value),
            "Final Code Files" => metrics.final_code_files = leading_int(value),
            _ => {}
        }
    }
    Some(metrics)
}

/// "12 steps" -> 12.
fn leading_int(value: &str) -> Option<u32> {
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
