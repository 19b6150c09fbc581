//! AI Integration Layer
//!
//! LLM providers, prompt templates and the helpers the chat stages share.

pub mod extract;
pub mod metrics;
pub mod preflight;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use extract::{code_block_or_text, parse_markdown_code_block};
pub use metrics::{
    MetricsCollector, MetricsSummary, SharedMetrics, StageMetrics, create_shared_metrics,
};
pub use preflight::{CheckResult, PreflightCheck, PreflightResult};
pub use prompt::{PromptLoader, PromptSource, combine_prompts};
pub use provider::{
    AnthropicProvider, ChainConfig, ChainedProvider, LlmProvider, LlmResponse, ModelParams,
    OllamaProvider, OpenAiProvider, ProviderChain, ProviderChainBuilder, ProviderConfig,
    ResponseMetadata, ResponseTiming, SharedProvider, TokenUsage, build_provider, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
