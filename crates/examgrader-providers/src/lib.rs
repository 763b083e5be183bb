//! examgrader-providers — Grading-service integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible chat completion
//! APIs and the Anthropic messages API, plus configuration loading and the
//! provider/store factories used by the CLI.

pub mod anthropic;
pub mod config;
mod http;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, ExamgraderConfig, ProviderConfig, StoreConfig};
pub use examgrader_core::error::ProviderError;
