//! Dashboard summary statistics.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Submission;

/// Pass counts for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    /// 1-based question index.
    pub question: usize,
    /// Submissions with a passing verdict on this question.
    pub passed: usize,
    /// `passed / total_count`, or 0 when there are no submissions.
    pub pass_rate: f64,
}

/// Summary over a snapshot of submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_count: usize,
    pub unique_students: usize,
    /// Newest `created_at`, if any.
    pub latest_timestamp: Option<DateTime<Utc>>,
    /// One entry per question, in order.
    pub per_question: Vec<QuestionStats>,
}

impl DashboardStats {
    /// Pass rate for the 1-based question `index`; 0 for unknown questions.
    pub fn pass_rate(&self, index: usize) -> f64 {
        index
            .checked_sub(1)
            .and_then(|i| self.per_question.get(i))
            .map_or(0.0, |q| q.pass_rate)
    }
}

/// Summarize a snapshot. A submission missing the verdict for a question
/// counts as not passing it.
pub fn summarize<'a, I>(submissions: I, question_count: usize) -> DashboardStats
where
    I: IntoIterator<Item = &'a Submission>,
{
    let mut total_count = 0usize;
    let mut students = HashSet::new();
    let mut latest_timestamp: Option<DateTime<Utc>> = None;
    let mut passed = vec![0usize; question_count];

    for submission in submissions {
        total_count += 1;
        students.insert(submission.student_id.as_str());
        latest_timestamp = latest_timestamp.max(Some(submission.created_at));

        for (slot, verdict) in passed.iter_mut().zip(&submission.feedbacks) {
            if verdict.outcome.is_pass() {
                *slot += 1;
            }
        }
    }

    let per_question = passed
        .into_iter()
        .enumerate()
        .map(|(i, passed)| QuestionStats {
            question: i + 1,
            passed,
            pass_rate: if total_count == 0 {
                0.0
            } else {
                passed as f64 / total_count as f64
            },
        })
        .collect();

    DashboardStats {
        total_count,
        unique_students: students.len(),
        latest_timestamp,
        per_question,
    }
}
