//! Formatting for durations and the build summary.

use std::time::Duration;

use knit_bundler::BuildSummary;
use owo_colors::OwoColorize;

use super::messages;

pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub(crate) fn summary_line(summary: &BuildSummary, elapsed: Duration) -> String {
    format!(
        "{} in {} ({}, {})",
        plural(summary.task_count(), "task"),
        format_duration(elapsed),
        plural(summary.errors, "error"),
        plural(summary.warnings, "warning"),
    )
}

/// Print failed tasks with their diagnostics, then one summary line.
pub fn print_build_summary(summary: &BuildSummary, elapsed: Duration) {
    for outcome in summary.failed_tasks() {
        eprintln!("\n{}", outcome.label.bold());
        for diagnostic in &outcome.diagnostics {
            eprintln!("  {}", diagnostic);
        }
    }

    let line = summary_line(summary, elapsed);
    if summary.is_success() {
        messages::success(&format!("Built {line}"));
    } else {
        messages::error(&format!(
            "Build failed: {} of {}",
            plural(summary.failed_tasks().count(), "task"),
            line
        ));
    }
}
