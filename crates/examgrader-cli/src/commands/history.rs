//! The `examgrader history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examgrader_core::dashboard::fetch_history;

use super::{open_store, passed_label};

pub async fn execute(student_id: String, limit: usize, config_path: Option<PathBuf>) -> Result<()> {
    let config = examgrader_providers::config::load_config_from(config_path.as_deref())?;
    let store = open_store(&config)?;

    let snapshot = fetch_history(store.as_ref(), &student_id, limit).await;
    if let Some(diagnostic) = &snapshot.diagnostic {
        eprintln!("Could not read submissions: {diagnostic}");
    }
    if snapshot.is_empty() {
        println!("No submissions for {}.", student_id.trim());
        return Ok(());
    }

    for stored in &snapshot.submissions {
        let record = &stored.record;
        println!(
            "{} | {} | passed {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.model,
            passed_label(record)
        );

        let mut table = Table::new();
        table.set_header(vec!["#", "Answer", "Feedback"]);
        for (i, answer) in record.answers.iter().enumerate() {
            let feedback = record
                .verdict(i + 1)
                .map(|v| v.to_feedback_line())
                .unwrap_or_default();
            table.add_row(vec![Cell::new(i + 1), Cell::new(answer), Cell::new(feedback)]);
        }
        println!("{table}\n");
    }

    Ok(())
}
