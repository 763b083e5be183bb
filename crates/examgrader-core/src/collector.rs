//! Answer collection and validation.

use crate::error::ValidationError;
use crate::model::SubmissionDraft;

/// Validate a student's answers and build a draft submission.
///
/// The student id is trimmed; answers are kept exactly as typed. Nothing is
/// persisted here.
pub fn collect<S: AsRef<str>>(
    student_id: &str,
    answers: &[S],
    question_count: usize,
) -> Result<SubmissionDraft, ValidationError> {
    let student_id = student_id.trim();
    if student_id.is_empty() {
        return Err(ValidationError::MissingStudentId);
    }

    check_answers(answers, question_count)?;

    Ok(SubmissionDraft {
        student_id: student_id.to_string(),
        answers: answers.iter().map(|a| a.as_ref().to_string()).collect(),
    })
}

/// Check answer count and emptiness. Shared with the grading engine, which
/// re-checks before spending any remote call.
pub(crate) fn check_answers<S: AsRef<str>>(
    answers: &[S],
    question_count: usize,
) -> Result<(), ValidationError> {
    if answers.len() != question_count {
        return Err(ValidationError::AnswerCountMismatch {
            expected: question_count,
            actual: answers.len(),
        });
    }

    if let Some(index) = answers.iter().position(|a| a.as_ref().trim().is_empty()) {
        return Err(ValidationError::EmptyAnswer(index + 1));
    }

    Ok(())
}
