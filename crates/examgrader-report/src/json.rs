//! JSON export of a dashboard snapshot.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use examgrader_core::dashboard::Snapshot;
use examgrader_core::model::StoredSubmission;
use examgrader_core::statistics::DashboardStats;

use crate::csv_export::column_count;

#[derive(Serialize)]
struct JsonExport<'a> {
    fetched_at: DateTime<Utc>,
    stats: DashboardStats,
    submissions: &'a [StoredSubmission],
}

/// Write the snapshot and its summary statistics as pretty-printed JSON.
pub fn write_json<W: Write>(writer: W, snapshot: &Snapshot) -> Result<()> {
    let export = JsonExport {
        fetched_at: snapshot.fetched_at,
        stats: snapshot.stats(column_count(&snapshot.submissions)),
        submissions: &snapshot.submissions,
    };
    serde_json::to_writer_pretty(writer, &export)?;
    Ok(())
}

/// Write a JSON export to `path`.
pub fn export_json(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    write_json(std::io::BufWriter::new(file), snapshot)
        .with_context(|| format!("failed to write JSON: {}", path.display()))
}
