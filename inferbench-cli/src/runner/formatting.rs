//! Output Formatting
//!
//! Human-readable output for a [`Results`] record:
//! - Run information (start time, runs, device, env, limit)
//! - One section per benchmark, one row per phase
//! - Confidence warnings under the row they belong to
//! - Collected run errors and a pass/fail summary

use super::statistics::{RowSummary, compute_statistics};
use inferbench_report::Results;
use inferbench_stats::format_duration;

/// Format results for terminal display
pub fn format_human_output(results: &Results) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("inferbench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    output.push_str(&format!("Started:  {}\n", results.started_string()));
    output.push_str(&format!("Runs:     {}\n", results.n_runs));
    output.push_str(&format!(
        "Device:   {}\n",
        results.device.as_deref().unwrap_or("unspecified")
    ));
    if let Some(env) = &results.env {
        output.push_str(&format!("Env:      {}\n", env));
    }
    if let Some(limit) = results.limit {
        output.push_str(&format!("Limit:    {} instances\n", limit));
    }
    output.push('\n');

    let rows = compute_statistics(results.measurements.as_deref().unwrap_or_default());

    // Group rows by label, first-seen order
    let mut groups: Vec<(&str, Vec<&RowSummary>)> = Vec::new();
    for row in &rows {
        match groups.iter_mut().find(|(label, _)| *label == row.label) {
            Some((_, members)) => members.push(row),
            None => groups.push((row.label.as_str(), vec![row])),
        }
    }

    for (label, members) in groups {
        output.push_str(&format!("Benchmark: {}\n", label));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for row in members {
            output.push_str(&format!("  {} ({} samples)\n", row.sub_label, row.samples));
            if row.samples == 0 {
                continue;
            }
            output.push_str(&format!(
                "      median: {:.3} {}  mean: {:.3} {}  IQR: {:.3} {}\n",
                row.scaled(row.median),
                row.unit,
                row.scaled(row.mean),
                row.unit,
                row.scaled(row.iqr),
                row.unit
            ));
            for warning in &row.warnings {
                output.push_str(warning);
                output.push('\n');
            }
        }
        output.push('\n');
    }

    if !results.errors.is_empty() {
        output.push_str("Errors\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        for error in &results.errors {
            output.push_str(&format!("  ✗ {}\n", error));
        }
        output.push('\n');
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Runs: {}  Succeeded: {}  Failed: {}\n",
        results.attempts(),
        results.successes,
        results.failures
    ));
    if let Some(duration) = results.duration {
        output.push_str(&format!("  Duration: {}\n", format_duration(duration)));
    }

    output
}
