//! Grading orchestrator.
//!
//! Grades every answer of a draft submission against the rubric, one
//! grading-service call per question, and assembles a complete
//! [`Submission`]. Calls are fanned out behind a semaphore and joined by
//! index. A failing call turns into a failing verdict for that question only;
//! `grade` never fails once the draft has passed validation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::collector::check_answers;
use crate::error::{ProviderError, ValidationError};
use crate::model::{Rubric, Submission, SubmissionDraft, Verdict};
use crate::normalize::{normalize_str, MAX_FEEDBACK_CHARS};
use crate::traits::{
    CompletionRequest, CompletionResponse, LlmProvider, TokenUsage, DEFAULT_SYSTEM_PROMPT,
};

/// Upper bound on any single retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Model identifier sent to the provider and recorded on the submission.
    pub model: String,
    /// System role text.
    pub system_prompt: String,
    /// Max tokens per grading response.
    pub max_tokens: u32,
    /// Sampling temperature; `None` keeps the provider default.
    pub temperature: Option<f64>,
    /// Maximum concurrent grading calls.
    pub parallelism: usize,
    /// Retries per question on transient provider errors.
    pub max_retries: u32,
    /// Initial delay between retries.
    pub retry_delay: Duration,
    /// Per-call timeout.
    pub request_timeout: Duration,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-5-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1000,
            temperature: None,
            parallelism: 3,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// A question whose grading call failed after all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFailure {
    /// 1-based question index.
    pub question: usize,
    /// The last error, as text.
    pub error: String,
}

/// Result of grading one draft.
#[derive(Debug, Clone)]
pub struct GradingOutcome {
    /// The graded submission, always with one verdict per answer.
    pub submission: Submission,
    /// Questions that fell back to a failing verdict because of remote errors.
    pub remote_failures: Vec<QuestionFailure>,
    /// Token usage summed over all successful calls.
    pub token_usage: TokenUsage,
    /// Wall-clock grading time in milliseconds.
    pub duration_ms: u64,
}

impl GradingOutcome {
    /// Whether any question fell back because of a remote error.
    pub fn is_partial(&self) -> bool {
        !self.remote_failures.is_empty()
    }
}

struct QuestionResult {
    verdict: Verdict,
    failure: Option<QuestionFailure>,
    usage: TokenUsage,
}

/// The grading engine.
pub struct GradingEngine {
    provider: Arc<dyn LlmProvider>,
    rubric: Arc<Rubric>,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        rubric: Arc<Rubric>,
        config: GradingEngineConfig,
    ) -> Self {
        Self {
            provider,
            rubric,
            config,
        }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn config(&self) -> &GradingEngineConfig {
        &self.config
    }

    /// Grade every answer in `draft`.
    ///
    /// Returns a `ValidationError` without calling the provider if the draft
    /// does not have one non-empty answer per rubric entry.
    pub async fn grade(&self, draft: &SubmissionDraft) -> Result<GradingOutcome, ValidationError> {
        if draft.student_id.trim().is_empty() {
            return Err(ValidationError::MissingStudentId);
        }
        check_answers(&draft.answers, self.rubric.len())?;

        let start = Instant::now();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));

        let calls = draft.answers.iter().enumerate().map(|(i, answer)| {
            let index = i + 1;
            let criterion = self.rubric.criterion(index).unwrap_or_default();
            self.grade_question(index, criterion, answer, &semaphore)
        });
        let results = join_all(calls).await;

        let mut feedbacks = Vec::with_capacity(results.len());
        let mut remote_failures = Vec::new();
        let mut token_usage = TokenUsage::default();
        for result in results {
            feedbacks.push(result.verdict);
            remote_failures.extend(result.failure);
            token_usage.add(&result.usage);
        }

        let submission = Submission {
            student_id: draft.student_id.clone(),
            answers: draft.answers.clone(),
            feedbacks,
            model: self.config.model.clone(),
            created_at: chrono::Utc::now(),
        };

        tracing::info!(
            student_id = %submission.student_id,
            passed = submission.passed_count(),
            questions = submission.feedbacks.len(),
            remote_failures = remote_failures.len(),
            "graded submission"
        );

        Ok(GradingOutcome {
            submission,
            remote_failures,
            token_usage,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn grade_question(
        &self,
        index: usize,
        criterion: &str,
        answer: &str,
        semaphore: &Semaphore,
    ) -> QuestionResult {
        // The semaphore is never closed, so a permit is always granted.
        let _permit = semaphore.acquire().await.ok();

        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: self.config.system_prompt.clone(),
            prompt: grading_prompt(index, criterion, answer),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.complete_with_retry(index, &request).await {
            Ok(response) => QuestionResult {
                verdict: normalize_str(&response.content),
                failure: None,
                usage: response.token_usage,
            },
            Err(e) => {
                tracing::warn!(question = index, "grading call failed: {e:#}");
                QuestionResult {
                    verdict: normalize_str(&format!("grading service error: {e}")),
                    failure: Some(QuestionFailure {
                        question: index,
                        error: format!("{e:#}"),
                    }),
                    usage: TokenUsage::default(),
                }
            }
        }
    }

    async fn complete_with_retry(
        &self,
        index: usize,
        request: &CompletionRequest,
    ) -> anyhow::Result<CompletionResponse> {
        let mut retry_delay = self.config.retry_delay;
        let mut retry = 0;

        loop {
            let result =
                match tokio::time::timeout(self.config.request_timeout, self.provider.complete(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(self.config.request_timeout.as_secs()).into()),
                };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let provider_error = error.downcast_ref::<ProviderError>();
            if retry >= self.config.max_retries
                || provider_error.is_some_and(ProviderError::is_permanent)
            {
                return Err(error);
            }
            if let Some(ms) = provider_error.and_then(ProviderError::retry_after_ms) {
                retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
            }

            retry += 1;
            tracing::warn!(question = index, retry, "retrying grading call: {error}");
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
    }
}

/// Build the user prompt for one question.
pub fn grading_prompt(index: usize, criterion: &str, answer: &str) -> String {
    format!(
        "Question number: {index}\n\
         Grading criterion: {criterion}\n\
         Student answer: {answer}\n\
         \n\
         Output rules:\n\
         - Reply with exactly one line\n\
         - The line must be exactly 'O: ...' if the answer meets the criterion, otherwise 'X: ...'\n\
         - Write the feedback kindly, as if speaking to the student, within {MAX_FEEDBACK_CHARS} characters\n"
    )
}
