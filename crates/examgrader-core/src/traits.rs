//! Core trait definitions for grading services and submission stores.
//!
//! These async traits are implemented by the `examgrader-providers` and
//! `examgrader-store` crates respectively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{StoredSubmission, Submission, SubmissionFilter};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for text-completion backends used as grading services.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Request one completion.
    ///
    /// Errors should be [`crate::error::ProviderError`] wrapped in
    /// `anyhow::Error` so callers can classify them for retries.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// List models this provider is known to serve.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "gpt-5-mini").
    pub model: String,
    /// System role text.
    pub system_prompt: String,
    /// User message.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature; `None` leaves the provider default.
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually produced the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting for one or more completions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Add another usage record into this one.
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Submission store trait
// ---------------------------------------------------------------------------

/// Append-only storage for graded submissions.
///
/// Reads are always ordered by `created_at`, newest first.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Human-readable backend name (e.g. "supabase").
    fn name(&self) -> &str;

    /// Append one submission and return it with its store-assigned id.
    async fn insert(&self, submission: &Submission) -> Result<StoredSubmission, StoreError>;

    /// Read submissions matching `filter`.
    async fn query(&self, filter: &SubmissionFilter) -> Result<Vec<StoredSubmission>, StoreError>;

    /// Read one student's submissions by exact id.
    async fn query_by_student(
        &self,
        student_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredSubmission>, StoreError>;
}

// ---------------------------------------------------------------------------
// Default system prompt
// ---------------------------------------------------------------------------

/// Default system prompt for grading requests.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a kind but precise science teacher. Always follow the output rules exactly.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_add() {
        let mut total = TokenUsage::default();
        total.add(&TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.add(&TokenUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        });
        assert_eq!(total.total_tokens, 18);
        assert_eq!(total.prompt_tokens, 11);
    }

    #[test]
    fn completion_request_temperature_defaults_to_none() {
        let json = r#"{"model":"m","system_prompt":"s","prompt":"p","max_tokens":10}"#;
        let request: CompletionRequest = serde_json::from_str(json).unwrap();
        assert!(request.temperature.is_none());
    }
}
