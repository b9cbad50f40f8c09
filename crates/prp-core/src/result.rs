//! Single JSON document formatting.

use std::io::Write;

use serde_json::{json, Value};
use tracing::debug;

use crate::event::ResultSummary;

/// Marker placed in the fallback object when the output is not JSON.
pub const PARSE_ERROR_MARKER: &str = "Failed to parse JSON output";

/// Parse captured agent stdout as one JSON document.
///
/// Invalid JSON never fails: it becomes `{"error": ..., "raw": <text>}` and the
/// parse error is reported on `diag`.
pub fn parse_document<D: Write>(stdout: &str, diag: &mut D) -> std::io::Result<Value> {
    match serde_json::from_str::<Value>(stdout) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, bytes = stdout.len(), "agent output is not JSON");
            writeln!(diag, "Error parsing JSON output: {e}")?;
            Ok(json!({
                "error": PARSE_ERROR_MARKER,
                "raw": stdout,
            }))
        }
    }
}

/// Pretty-print `document` to `out` and, for `result` documents, write a
/// summary to `diag`.
pub fn write_document<O: Write, D: Write>(
    document: &Value,
    out: &mut O,
    diag: &mut D,
) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, document)?;
    out.write_all(b"\n")?;
    out.flush()?;

    if document.get("type").and_then(Value::as_str) == Some("result") {
        let summary = ResultSummary::from_event(document);
        writeln!(diag)?;
        writeln!(diag, "Summary:")?;
        writeln!(diag, "  Success: {}", summary.document_success())?;
        writeln!(diag, "  Cost: {}", summary.cost_display())?;
        writeln!(diag, "  Duration: {}ms", summary.duration_ms)?;
        writeln!(
            diag,
            "  Session: {}",
            summary.session_id.as_deref().unwrap_or("unknown")
        )?;
    }

    Ok(())
}

/// Parse and write in one step. Returns the document that was written.
pub fn format_output<O: Write, D: Write>(
    stdout: &str,
    out: &mut O,
    diag: &mut D,
) -> std::io::Result<Value> {
    let document = parse_document(stdout, diag)?;
    write_document(&document, out, diag)?;
    Ok(document)
}
