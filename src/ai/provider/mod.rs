//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait: the single "messages in, text out"
//! primitive every chat stage is built on.
//! All providers return `LlmResponse` with token usage for the session metrics.
//!
//! ## Modules
//!
//! - `openai`: OpenAI Chat Completions (and compatible endpoints)
//! - `anthropic`: Anthropic Messages API
//! - `ollama`: Local Ollama chat API
//! - `chain`: Fallback provider chain with retry and backoff

mod anthropic;
mod chain;
mod ollama;
mod openai;

pub use anthropic::AnthropicProvider;
pub use chain::{ChainConfig, ChainedProvider, ProviderChain, ProviderChainBuilder};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{LlmConfig, ProviderKind};
use crate::types::{ChatMessage, Result};

// =============================================================================
// Model Parameters
// =============================================================================

/// Sampling parameters sent with every completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl ModelParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Same sampling settings addressed to another model
    pub fn for_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including text, usage metrics, and timing
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }

    pub fn with_metrics(
        content: String,
        usage: TokenUsage,
        timing: ResponseTiming,
        metadata: ResponseMetadata,
    ) -> Self {
        Self {
            content,
            usage,
            timing,
            metadata,
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Anthropic-style usage response
    pub fn from_anthropic(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Create from Ollama-style usage response
    pub fn from_ollama(prompt_eval_count: u32, eval_count: u32) -> Self {
        Self {
            input_tokens: prompt_eval_count,
            output_tokens: eval_count,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Model used
    pub model: String,
    /// Provider name
    pub provider: String,
}

/// Shared LLM provider type for concurrent access across chat stages.
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for LLM providers
///
/// Note: API keys are never serialized to output and are redacted in debug
/// output. Each provider converts the key to `SecretString` internally.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    /// Model name (provider-specific)
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// API key, falls back to the provider's environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ProviderConfig {
    /// Primary provider settings from the `[llm]` section
    pub fn primary(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            provider: config.provider_kind()?,
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            api_key: config.api_key.clone(),
            api_base: config.api_base.clone(),
        })
    }

    /// Fallback provider settings, if one is configured.
    ///
    /// The fallback reuses the primary model when `fallback_model` is unset,
    /// and never inherits the primary's key or base URL unless the provider is the same.
    pub fn fallback(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(name) = &config.fallback_provider else {
            return Ok(None);
        };
        let provider: ProviderKind = name.parse().map_err(crate::types::SublangError::Config)?;
        let same_provider = provider == config.provider_kind()?;

        Ok(Some(Self {
            provider,
            model: config
                .fallback_model
                .clone()
                .unwrap_or_else(|| config.model.clone()),
            timeout_secs: config.timeout_secs,
            api_key: same_provider.then(|| config.api_key.clone()).flatten(),
            api_base: same_provider.then(|| config.api_base.clone()).flatten(),
        }))
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Chat completion provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send an ordered conversation and return the assistant's reply
    async fn complete(&self, messages: &[ChatMessage], params: &ModelParams)
    -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;

    /// Check if the provider is available
    async fn health_check(&self) -> Result<bool>;
}

/// Create a single shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider {
        ProviderKind::OpenAi => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        ProviderKind::Anthropic => Ok(Arc::new(AnthropicProvider::new(config.clone())?)),
        ProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
    }
}

/// Build the provider used by the assistant: the primary provider wrapped in
/// a retrying chain, followed by the fallback when one is configured.
pub fn build_provider(config: &LlmConfig) -> Result<SharedProvider> {
    let mut builder = ProviderChainBuilder::new().add_shared_with_retries(
        create_provider(&ProviderConfig::primary(config)?)?,
        config.max_retries,
    );

    if let Some(fallback) = ProviderConfig::fallback(config)? {
        builder = builder.add_shared_with_retries(create_provider(&fallback)?, config.max_retries);
    }

    Ok(Arc::new(builder.build()))
}
