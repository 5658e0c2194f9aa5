use std::io::Write;

use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::http::RunReport;
use crate::metrics::StatusCounts;

/// Renders the final histogram.
///
/// `Json` is a single object keyed by status code (`{"200":20}`); `Text` is
/// one `status: count` line per code followed by a totals line.
///
/// # Errors
///
/// Returns an error when JSON serialization fails.
pub fn render_result(
    counts: &StatusCounts,
    report: &RunReport,
    format: OutputFormat,
) -> AppResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(counts)?),
        OutputFormat::Text => Ok(text_lines(counts, report).join("\n")),
    }
}

/// Writes the rendered result to stderr, followed by a newline.
///
/// # Errors
///
/// Returns an error when rendering or writing fails.
pub fn write_result(
    counts: &StatusCounts,
    report: &RunReport,
    format: OutputFormat,
) -> AppResult<()> {
    let rendered = render_result(counts, report, format)?;
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{}", rendered)?;
    stderr.flush()?;
    Ok(())
}

fn text_lines(counts: &StatusCounts, report: &RunReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(counts.len().saturating_add(2));
    lines.push("Status codes:".to_owned());
    if counts.is_empty() {
        lines.push("  (none)".to_owned());
    }
    for (status, count) in counts.iter() {
        lines.push(format!("  {}: {}", status, count));
    }
    lines.push(format!(
        "Completed: {}, failed: {}, attempted: {}, not dispatched: {}{}",
        counts.total(),
        report.transport_errors,
        report.attempted,
        report.undispatched,
        if report.stopped { " (stopped)" } else { "" }
    ));
    lines
}
