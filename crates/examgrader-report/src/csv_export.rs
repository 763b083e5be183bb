//! CSV export of submission snapshots.
//!
//! Output is UTF-8 with a byte-order marker so spreadsheet tools pick the
//! right encoding, one row per submission with interleaved
//! `answer_i`/`feedback_i` columns.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use examgrader_core::model::StoredSubmission;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Default export file name for a snapshot taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("student_submissions_{}.csv", at.format("%Y%m%d_%H%M"))
}

/// Number of question columns needed to hold every submission.
pub fn column_count(submissions: &[StoredSubmission]) -> usize {
    submissions
        .iter()
        .map(|s| s.record.answers.len().max(s.record.feedbacks.len()))
        .max()
        .unwrap_or(0)
}

fn header(questions: usize) -> Vec<String> {
    let mut header = vec!["id".to_string(), "created_at".into(), "student_id".into()];
    for i in 1..=questions {
        header.push(format!("answer_{i}"));
        header.push(format!("feedback_{i}"));
    }
    header.push("model".into());
    header
}

/// Write `submissions` as CSV, in the order given, with at least
/// `min_questions` answer/feedback column pairs.
pub fn write_csv<W: Write>(
    mut writer: W,
    submissions: &[StoredSubmission],
    min_questions: usize,
) -> Result<()> {
    writer.write_all(BOM)?;

    let questions = column_count(submissions).max(min_questions);
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(header(questions))?;

    for stored in submissions {
        let record = &stored.record;
        let mut row = vec![
            stored.id.clone(),
            record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.student_id.clone(),
        ];
        for i in 0..questions {
            row.push(record.answers.get(i).cloned().unwrap_or_default());
            row.push(
                record
                    .feedbacks
                    .get(i)
                    .map(|v| v.to_feedback_line())
                    .unwrap_or_default(),
            );
        }
        row.push(record.model.clone());
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Write a CSV export to `path`.
pub fn export_csv(
    path: &Path,
    submissions: &[StoredSubmission],
    min_questions: usize,
) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    write_csv(std::io::BufWriter::new(file), submissions, min_questions)
        .with_context(|| format!("failed to write CSV: {}", path.display()))
}
