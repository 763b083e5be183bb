//! Core data model types for examgrader.
//!
//! A submission moves through three states, each a separate immutable value:
//! `SubmissionDraft` (collected), `Submission` (graded), and
//! `StoredSubmission` (persisted).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_str;

/// A single short-answer question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// The question text shown to the student.
    pub prompt: String,
    /// The grading criterion sent to the grading service.
    pub criterion: String,
}

/// An exam: a titled, ordered list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique identifier for this exam.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Description shown above the questions.
    #[serde(default)]
    pub description: String,
    /// The questions, in display order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Exam {
    /// Number of questions (N).
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Build the immutable rubric for this exam.
    pub fn rubric(&self) -> Rubric {
        Rubric::new(self.questions.iter().map(|q| q.criterion.clone()).collect())
    }
}

/// Grading criteria keyed by 1-based question index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rubric {
    criteria: Vec<String>,
}

impl Rubric {
    pub fn new(criteria: Vec<String>) -> Self {
        Self { criteria }
    }

    /// Criterion for the 1-based question `index`.
    pub fn criterion(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.criteria.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Iterate `(index, criterion)` pairs with 1-based indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.criteria
            .iter()
            .enumerate()
            .map(|(i, c)| (i + 1, c.as_str()))
    }
}

/// Binary grading outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    /// The one-letter marker used in feedback lines.
    pub fn marker(self) -> char {
        match self {
            Outcome::Pass => 'O',
            Outcome::Fail => 'X',
        }
    }

    pub fn is_pass(self) -> bool {
        self == Outcome::Pass
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => write!(f, "pass"),
            Outcome::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" | "o" => Ok(Outcome::Pass),
            "fail" | "x" => Ok(Outcome::Fail),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// The pass/fail judgment and feedback for one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Pass,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail,
            message: message.into(),
        }
    }

    /// Render as the stored one-line form, `O: <message>` or `X: <message>`.
    pub fn to_feedback_line(&self) -> String {
        format!("{}: {}", self.outcome.marker(), self.message)
    }

    /// Decode a stored feedback column.
    ///
    /// Well-formed `O:`/`X:` lines are taken verbatim so a message that was
    /// already truncated is not truncated again; anything else goes through
    /// the normalizer.
    pub fn from_feedback_line(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(body) = trimmed.strip_prefix("O:") {
            return Verdict::pass(body.trim());
        }
        if let Some(body) = trimmed.strip_prefix("X:") {
            return Verdict::fail(body.trim());
        }
        normalize_str(trimmed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_feedback_line())
    }
}

/// A collected, not yet graded submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    /// Trimmed student identifier.
    pub student_id: String,
    /// Raw answer texts, one per question.
    pub answers: Vec<String>,
}

/// A graded submission, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: String,
    pub answers: Vec<String>,
    /// Verdicts, index-aligned with `answers`.
    pub feedbacks: Vec<Verdict>,
    /// Grading model identifier.
    pub model: String,
    /// Capture time; the ordering and filtering key.
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Verdict for the 1-based question `index`.
    pub fn verdict(&self, index: usize) -> Option<&Verdict> {
        index.checked_sub(1).and_then(|i| self.feedbacks.get(i))
    }

    /// Number of passing verdicts.
    pub fn passed_count(&self) -> usize {
        self.feedbacks
            .iter()
            .filter(|v| v.outcome.is_pass())
            .count()
    }
}

/// A submission as read back from a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSubmission {
    /// Store-assigned identifier.
    pub id: String,
    #[serde(flatten)]
    pub record: Submission,
}

/// Read filter for submission queries. Predicates combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionFilter {
    /// Case-insensitive substring of the student id.
    pub student_id_contains: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl SubmissionFilter {
    /// Filter for submissions from the last `days` days; `0` means no date bound.
    pub fn recent_days(days: u32) -> Self {
        let created_after =
            (days > 0).then(|| Utc::now() - chrono::Duration::days(i64::from(days)));
        Self {
            created_after,
            ..Self::default()
        }
    }

    /// Add a student id search term. Blank terms are ignored.
    pub fn with_search(mut self, term: Option<&str>) -> Self {
        self.student_id_contains = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a submission satisfies the filter's predicates (ignores `limit`).
    pub fn matches(&self, submission: &Submission) -> bool {
        let id_ok = self.student_id_contains.as_ref().map_or(true, |term| {
            submission
                .student_id
                .to_lowercase()
                .contains(&term.to_lowercase())
        });
        let date_ok = self
            .created_after
            .map_or(true, |after| submission.created_at >= after);
        id_ok && date_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(student_id: &str) -> Submission {
        Submission {
            student_id: student_id.into(),
            answers: vec!["a".into(), "b".into()],
            feedbacks: vec![Verdict::pass("good"), Verdict::fail("missing")],
            model: "gpt-5-mini".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn outcome_display_and_parse() {
        assert_eq!(Outcome::Pass.to_string(), "pass");
        assert_eq!("FAIL".parse::<Outcome>().unwrap(), Outcome::Fail);
        assert_eq!("o".parse::<Outcome>().unwrap(), Outcome::Pass);
        assert!("maybe".parse::<Outcome>().is_err());
    }

    #[test]
    fn rubric_is_one_based() {
        let rubric = Rubric::new(vec!["first".into(), "second".into()]);
        assert_eq!(rubric.criterion(1), Some("first"));
        assert_eq!(rubric.criterion(2), Some("second"));
        assert_eq!(rubric.criterion(0), None);
        assert_eq!(rubric.criterion(3), None);
        let indices: Vec<usize> = rubric.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn feedback_line_roundtrip_keeps_truncated_message() {
        let long = format!("{}…", "a".repeat(200));
        let verdict = Verdict::fail(long.clone());
        let decoded = Verdict::from_feedback_line(&verdict.to_feedback_line());
        assert_eq!(decoded, verdict);
        assert_eq!(decoded.message, long);
    }

    #[test]
    fn feedback_line_falls_back_to_normalizer() {
        let decoded = Verdict::from_feedback_line("O. fine");
        assert_eq!(decoded, Verdict::pass("fine"));
        let decoded = Verdict::from_feedback_line("");
        assert_eq!(decoded.outcome, Outcome::Fail);
    }

    #[test]
    fn filter_matches_case_insensitive_substring() {
        let filter = SubmissionFilter::default().with_search(Some("ab"));
        assert!(filter.matches(&sample("10AB3")));
        assert!(!filter.matches(&sample("10130")));
    }

    #[test]
    fn filter_blank_search_is_ignored() {
        let filter = SubmissionFilter::default().with_search(Some("   "));
        assert!(filter.student_id_contains.is_none());
        assert!(filter.matches(&sample("anyone")));
    }

    #[test]
    fn recent_days_zero_has_no_bound() {
        assert!(SubmissionFilter::recent_days(0).created_after.is_none());
        let week = SubmissionFilter::recent_days(7);
        let mut old = sample("s1");
        old.created_at = Utc::now() - chrono::Duration::days(8);
        assert!(!week.matches(&old));
        assert!(week.matches(&sample("s1")));
    }

    #[test]
    fn stored_submission_serde_flattens_record() {
        let stored = StoredSubmission {
            id: "42".into(),
            record: sample("10130"),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["student_id"], "10130");
        let back: StoredSubmission = serde_json::from_value(json).unwrap();
        assert_eq!(back, stored);
    }
}
