//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use examgrader_core::error::ProviderError;
use examgrader_core::traits::{
    CompletionRequest, CompletionResponse, LlmProvider, ModelInfo, TokenUsage,
};

/// A mock grading service for exercising the engine without real API calls.
///
/// Replies are chosen by prompt substring. Prompts matching a failure key
/// return a `ProviderError::ApiError` instead.
pub struct MockProvider {
    /// Map of prompt substring → response text.
    responses: HashMap<String, String>,
    /// Prompt substrings that make the call fail.
    failures: Vec<String>,
    /// Reply when no prompt matches.
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    /// Create a mock with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            failures: Vec::new(),
            default_response: "O: Good answer.".to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Fail every call whose prompt contains `key`.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failures.push(key.to_string());
        self
    }

    /// Number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// The last request made to this provider.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if self
            .failures
            .iter()
            .any(|key| request.prompt.contains(key.as_str()))
        {
            return Err(ProviderError::ApiError {
                status: 500,
                message: "mock failure".into(),
            }
            .into());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate, four bytes per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "mock-model".into(),
            system_prompt: String::new(),
            prompt: prompt.into(),
            max_tokens: 100,
            temperature: None,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("X: Try again.");
        let response = provider.complete(&request("anything")).await.unwrap();
        assert_eq!(response.content, "X: Try again.");
        assert_eq!(response.model, "mock-model");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert("Boyle".to_string(), "O: Correct relation.".to_string());
        responses.insert("radiation".to_string(), "X: Missing one mode.".to_string());

        let provider = MockProvider::new(responses);

        let resp = provider.complete(&request("Explain Boyle's law")).await.unwrap();
        assert_eq!(resp.content, "O: Correct relation.");

        let resp = provider
            .complete(&request("conduction and radiation"))
            .await
            .unwrap();
        assert_eq!(resp.content, "X: Missing one mode.");

        let resp = provider.complete(&request("unrelated")).await.unwrap();
        assert_eq!(resp.content, "O: Good answer.");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn failure_keys() {
        let provider = MockProvider::with_fixed_response("O: fine").failing_on("Question number: 2\n");

        assert!(provider
            .complete(&request("Question number: 1\n..."))
            .await
            .is_ok());
        let err = provider
            .complete(&request("Question number: 2\n..."))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ProviderError>().is_some());
        assert_eq!(provider.call_count(), 2);
    }
}
