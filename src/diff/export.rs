//! Human-readable diff export.
//!
//! The export keeps the report ordering, so two runs over the same snapshots
//! write byte-identical files.

use crate::diff::model::{DivergenceReport, Summary};
use crate::error::{Result, TrackerError};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// First line of every exported diff.
pub const EXPORT_HEADER: &str = "=== Diff Local vs Remote ===";

/// Render `report` in the export text format.
pub fn render_report(report: &DivergenceReport, summary: &Summary) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{EXPORT_HEADER}\n\nTotal changes: {}\n+ Added: {}\n- Deleted: {}\n* Renamed: {}\n\n",
        summary.total(),
        summary.added(),
        summary.removed(),
        summary.renamed(),
    );

    out.push_str("Only in Remote:\n");
    for item in report.only_in_remote() {
        let _ = writeln!(out, "+ {}\n  {}", item.title(), item.id());
    }

    out.push_str("\nOnly in Local:\n");
    for item in report.only_in_local() {
        let _ = writeln!(out, "- {}\n  {}", item.title(), item.id());
    }

    out.push_str("\nTitle Changed:\n");
    for rename in report.renamed() {
        let _ = writeln!(
            out,
            "* {}\n  - {}\n  + {}",
            rename.id, rename.old_title, rename.new_title
        );
    }

    out
}

/// Write `report` to `path`, replacing any previous export.
///
/// Returns `Ok(false)` without touching the file when there is nothing to
/// report.
pub async fn export_report(
    path: &Path,
    report: &DivergenceReport,
    summary: &Summary,
) -> Result<bool> {
    if !summary.has_changes() {
        info!("no changes detected, no diff exported");
        return Ok(false);
    }

    let content = render_report(report, summary);
    tokio::fs::write(path, content)
        .await
        .map_err(|e| TrackerError::Export(format!("cannot write {}: {e}", path.display())))?;

    info!(path = %path.display(), "divergence report exported");
    Ok(true)
}
