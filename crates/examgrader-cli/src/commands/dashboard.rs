//! The `examgrader dashboard` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examgrader_core::dashboard::{fetch_snapshot, Snapshot};
use examgrader_core::model::SubmissionFilter;
use examgrader_report::csv_export::column_count;

use super::{open_store, passed_label};

pub async fn execute(search: Option<String>, days: u32, config_path: Option<PathBuf>) -> Result<()> {
    let config = examgrader_providers::config::load_config_from(config_path.as_deref())?;
    let store = open_store(&config)?;

    let filter = SubmissionFilter::recent_days(days).with_search(search.as_deref());
    let snapshot = fetch_snapshot(store.as_ref(), &filter).await;

    if let Some(diagnostic) = &snapshot.diagnostic {
        eprintln!("Could not read submissions: {diagnostic}");
    }
    if snapshot.is_empty() {
        println!("No submissions found.");
        return Ok(());
    }

    print_summary(&snapshot);
    print_submissions(&snapshot);
    Ok(())
}

fn print_summary(snapshot: &Snapshot) {
    let stats = snapshot.stats(column_count(&snapshot.submissions));

    let latest = stats
        .latest_timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "Submissions: {} | Students: {} | Latest: {}",
        stats.total_count, stats.unique_students, latest
    );

    let mut table = Table::new();
    table.set_header(vec!["Question", "Passed", "Pass rate"]);
    for q in &stats.per_question {
        table.add_row(vec![
            Cell::new(format!("Q{}", q.question)),
            Cell::new(q.passed),
            Cell::new(format!("{:.1}%", q.pass_rate * 100.0)),
        ]);
    }
    println!("{table}");
}

fn print_submissions(snapshot: &Snapshot) {
    let mut table = Table::new();
    table.set_header(vec!["Submitted", "Student", "Passed", "Model"]);
    for stored in &snapshot.submissions {
        let record = &stored.record;
        table.add_row(vec![
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.student_id),
            Cell::new(passed_label(record)),
            Cell::new(&record.model),
        ]);
    }
    println!("{table}");
}
