//! Configuration loading and the provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examgrader_core::engine::GradingEngineConfig;
use examgrader_core::traits::{LlmProvider, DEFAULT_SYSTEM_PROMPT};

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single grading service.
///
/// Debug output masks API keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Anthropic {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

/// Where submissions are persisted.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Supabase {
        url: String,
        api_key: String,
        #[serde(default = "default_table")]
        table: String,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Supabase {
                url,
                api_key: _,
                table,
            } => f
                .debug_struct("Supabase")
                .field("url", url)
                .field("api_key", &"***")
                .field("table", table)
                .finish(),
        }
    }
}

fn default_table() -> String {
    "student_submissions".to_string()
}

/// Top-level examgrader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamgraderConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Retries per question on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Max concurrent grading calls per submission.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Overrides the built-in system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-5-mini".to_string()
}
fn default_retries() -> u32 {
    1
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_request_timeout() -> u64 {
    120
}
fn default_parallelism() -> usize {
    3
}
fn default_max_tokens() -> u32 {
    1000
}

impl Default for ExamgraderConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            request_timeout_secs: default_request_timeout(),
            parallelism: default_parallelism(),
            max_tokens: default_max_tokens(),
            system_prompt: None,
            store: None,
        }
    }
}

impl ExamgraderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Grading engine settings, using `model` when given instead of
    /// `default_model`.
    pub fn engine_config(&self, model: Option<&str>) -> GradingEngineConfig {
        GradingEngineConfig {
            model: model.unwrap_or(&self.default_model).to_string(),
            system_prompt: self
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: self.max_tokens,
            temperature: None,
            parallelism: self.parallelism,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            request_timeout: self.request_timeout(),
        }
    }

    /// Build the named provider, or the default one.
    pub fn provider(&self, name: Option<&str>) -> Result<Box<dyn LlmProvider>> {
        let name = name.unwrap_or(&self.default_provider);
        let config = self.providers.get(name).with_context(|| {
            format!(
                "provider '{name}' is not configured; add [providers.{name}] to examgrader.toml \
                 or set EXAMGRADER_OPENAI_KEY / EXAMGRADER_ANTHROPIC_KEY"
            )
        })?;
        create_provider(config, self.request_timeout())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            org_id: org_id.as_deref().map(resolve_env_vars),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
        },
    }
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Supabase {
            url,
            api_key,
            table,
        } => StoreConfig::Supabase {
            url: resolve_env_vars(url),
            api_key: resolve_env_vars(api_key),
            table: resolve_env_vars(table),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examgrader.toml` in the current directory
/// 2. `~/.config/examgrader/config.toml`
///
/// Environment variable overrides: `EXAMGRADER_OPENAI_KEY`,
/// `EXAMGRADER_ANTHROPIC_KEY`, `EXAMGRADER_SUPABASE_URL`,
/// `EXAMGRADER_SUPABASE_KEY`.
pub fn load_config() -> Result<ExamgraderConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamgraderConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examgrader.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            toml::from_str::<ExamgraderConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamgraderConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.store = config.store.as_ref().map(resolve_store_config);

    Ok(config)
}

fn apply_env_overrides(config: &mut ExamgraderConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(key) = env("EXAMGRADER_ANTHROPIC_KEY") {
        match config.providers.get_mut("anthropic") {
            Some(ProviderConfig::Anthropic { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "anthropic".into(),
                    ProviderConfig::Anthropic {
                        api_key: key,
                        base_url: None,
                    },
                );
            }
        }
    }

    if let Some(key) = env("EXAMGRADER_OPENAI_KEY") {
        match config.providers.get_mut("openai") {
            Some(ProviderConfig::OpenAI { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "openai".into(),
                    ProviderConfig::OpenAI {
                        api_key: key,
                        base_url: None,
                        org_id: None,
                    },
                );
            }
        }
    }

    let env_url = env("EXAMGRADER_SUPABASE_URL");
    let env_key = env("EXAMGRADER_SUPABASE_KEY");
    match &mut config.store {
        Some(StoreConfig::Supabase { url, api_key, .. }) => {
            if let Some(u) = env_url {
                *url = u;
            }
            if let Some(k) = env_key {
                *api_key = k;
            }
        }
        None => {
            if let (Some(url), Some(api_key)) = (env_url, env_key) {
                config.store = Some(StoreConfig::Supabase {
                    url,
                    api_key,
                    table: default_table(),
                });
            }
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examgrader"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn LlmProvider>> {
    let provider: Box<dyn LlmProvider> = match config {
        ProviderConfig::Anthropic { api_key, base_url } => Box::new(
            AnthropicProvider::with_timeout(api_key, base_url.clone(), timeout)?,
        ),
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Box::new(OpenAiProvider::with_timeout(
            api_key,
            base_url.clone(),
            org_id.clone(),
            timeout,
        )?),
    };
    Ok(provider)
}
