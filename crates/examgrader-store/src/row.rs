//! Mapping between submissions and flat `student_submissions` rows.
//!
//! A row has `student_id`, `answer_1..N`, `feedback_1..N`, `model` and
//! `created_at`, plus a store-assigned `id` on the way back. The question
//! count is taken from the highest numbered `answer_`/`feedback_` column.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use examgrader_core::error::StoreError;
use examgrader_core::model::{StoredSubmission, Submission, Verdict};

/// Encode a submission as an insertable row. `id` is left to the store.
pub fn to_row(submission: &Submission) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("student_id".into(), Value::String(submission.student_id.clone()));
    for (i, answer) in submission.answers.iter().enumerate() {
        row.insert(format!("answer_{}", i + 1), Value::String(answer.clone()));
    }
    for (i, verdict) in submission.feedbacks.iter().enumerate() {
        row.insert(
            format!("feedback_{}", i + 1),
            Value::String(verdict.to_feedback_line()),
        );
    }
    row.insert("model".into(), Value::String(submission.model.clone()));
    row.insert(
        "created_at".into(),
        Value::String(
            submission
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
    );
    row
}

/// Decode a row read back from the store.
///
/// Missing or null answers read as empty strings. Feedback columns are read
/// up to the first missing one, so a record missing verdict `i` has fewer
/// than `i` feedbacks and counts as not passing question `i`.
pub fn from_row(row: &Map<String, Value>) -> Result<StoredSubmission, StoreError> {
    let id = match row.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(StoreError::MalformedRow("missing id".into())),
    };

    let student_id = required_str(row, "student_id")?.to_string();
    let created_at = DateTime::parse_from_rfc3339(required_str(row, "created_at")?)
        .map_err(|e| StoreError::MalformedRow(format!("bad created_at: {e}")))?
        .with_timezone(&Utc);
    let model = row
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let count = question_count(row);
    let answers = (1..=count)
        .map(|i| {
            row.get(&format!("answer_{i}"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    let feedbacks = (1..=count)
        .map_while(|i| {
            row.get(&format!("feedback_{i}"))
                .and_then(Value::as_str)
                .map(Verdict::from_feedback_line)
        })
        .collect();

    Ok(StoredSubmission {
        id,
        record: Submission {
            student_id,
            answers,
            feedbacks,
            model,
            created_at,
        },
    })
}

fn required_str<'a>(row: &'a Map<String, Value>, key: &str) -> Result<&'a str, StoreError> {
    row.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::MalformedRow(format!("missing {key}")))
}

fn question_count(row: &Map<String, Value>) -> usize {
    row.keys()
        .filter_map(|key| {
            key.strip_prefix("answer_")
                .or_else(|| key.strip_prefix("feedback_"))
        })
        .filter_map(|n| n.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
}
