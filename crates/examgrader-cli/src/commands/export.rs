//! The `examgrader export` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use examgrader_core::dashboard::fetch_snapshot;
use examgrader_core::model::SubmissionFilter;
use examgrader_core::parser::parse_exam;
use examgrader_report::{export_csv, export_file_name, export_json};

use super::open_store;

pub async fn execute(
    search: Option<String>,
    days: u32,
    output: Option<PathBuf>,
    format: String,
    exam: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if format != "csv" && format != "json" {
        bail!("unknown format: {format} (expected csv or json)");
    }
    let questions = match &exam {
        Some(path) => parse_exam(path)?.question_count(),
        None => 0,
    };

    let config = examgrader_providers::config::load_config_from(config_path.as_deref())?;
    let store = open_store(&config)?;

    let filter = SubmissionFilter::recent_days(days).with_search(search.as_deref());
    let snapshot = fetch_snapshot(store.as_ref(), &filter).await;
    if let Some(diagnostic) = &snapshot.diagnostic {
        bail!("could not read submissions: {diagnostic}");
    }

    let path = output.unwrap_or_else(|| {
        let name = export_file_name(snapshot.fetched_at);
        if format == "json" {
            PathBuf::from(name).with_extension("json")
        } else {
            PathBuf::from(name)
        }
    });

    if format == "json" {
        export_json(&path, &snapshot)?;
    } else {
        export_csv(&path, &snapshot.submissions, questions)?;
    }

    println!(
        "Exported {} submission(s) to {}",
        snapshot.submissions.len(),
        path.display()
    );
    Ok(())
}
