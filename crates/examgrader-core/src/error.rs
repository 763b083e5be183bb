//! Error types shared across examgrader.
//!
//! `ProviderError` lives here rather than in `examgrader-providers` so the
//! grading engine can downcast and classify errors for retry decisions
//! without string matching.

use thiserror::Error;

/// A submission that cannot be accepted because input is incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The student identifier is empty or whitespace.
    #[error("student id is required")]
    MissingStudentId,

    /// The answer at this 1-based question index is empty or whitespace.
    #[error("answer {0} is empty")]
    EmptyAnswer(usize),

    /// The number of answers does not match the number of questions.
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
}

/// Errors that can occur when calling a grading service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors returned by a submission store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// The store answered with an error status.
    #[error("store error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// A row could not be mapped to a submission.
    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// An insert returned no row.
    #[error("insert returned no row")]
    EmptyInsert,
}
