//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (`<config dir>/sublang/`) and project (`.sublang/`) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants;
use crate::types::{Result, SublangError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Conversation settings
    pub chat: ChatConfig,

    /// Design pipeline settings
    pub design: DesignConfig,

    /// Prompt template settings
    pub prompts: PromptsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            chat: ChatConfig::default(),
            design: DesignConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `SublangError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(SublangError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(SublangError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.max_retries == 0 {
            return Err(SublangError::Config(
                "LLM max_retries must be at least 1".to_string(),
            ));
        }

        if self.llm.max_tokens == Some(0) {
            return Err(SublangError::Config(
                "LLM max_tokens must be greater than 0 when set".to_string(),
            ));
        }

        self.llm.provider.parse::<ProviderKind>().map_err(SublangError::Config)?;

        if let Some(fallback) = &self.llm.fallback_provider {
            fallback.parse::<ProviderKind>().map_err(SublangError::Config)?;
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    /// Whether the provider needs an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }

    /// Environment variable holding the provider's API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        constants::llm::API_KEY_ENV_VARS
            .iter()
            .find(|(name, _)| *name == self.to_string())
            .map(|(_, var)| *var)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!(
                "Unknown provider: {}. Valid values: openai, anthropic, ollama",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,

    /// Sampling temperature (0.0 = deterministic, 2.0 = most random)
    pub temperature: f32,

    /// Maximum tokens per completion (provider default when unset)
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Override for the provider's API base URL
    pub api_base: Option<String>,

    /// API key (prefer the provider's environment variable)
    pub api_key: Option<String>,

    /// Fallback provider for retry chain
    pub fallback_provider: Option<String>,

    /// Fallback model for retry chain
    pub fallback_model: Option<String>,

    /// Attempts per provider before falling back
    pub max_retries: u8,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: constants::llm::DEFAULT_PROVIDER.to_string(),
            model: constants::llm::DEFAULT_MODEL.to_string(),
            temperature: constants::llm::DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_secs: constants::network::DEFAULT_TIMEOUT_SECS,
            api_base: None,
            api_key: None,
            fallback_provider: None,
            fallback_model: None,
            max_retries: constants::chain::DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    /// Parsed provider kind
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.provider.parse().map_err(SublangError::Config)
    }
}

// =============================================================================
// Chat Configuration
// =============================================================================

/// Intent classification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Ask the LLM whether the conversation is about software design
    #[default]
    Llm,
    /// Offline keyword matching
    Keyword,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Llm => write!(f, "llm"),
            ClassifierKind::Keyword => write!(f, "keyword"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub classifier: ClassifierKind,

    /// History entries passed to the responders
    pub history_window: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            history_window: constants::chat::DEFAULT_HISTORY_WINDOW,
        }
    }
}

// =============================================================================
// Design Configuration
// =============================================================================

/// How design requests are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DesignMode {
    /// Scenarios, terms, features, constraints
    #[default]
    Staged,
    /// One call with the DESIGN_SPECS prompt
    Single,
}

impl std::fmt::Display for DesignMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignMode::Staged => write!(f, "staged"),
            DesignMode::Single => write!(f, "single"),
        }
    }
}

impl std::str::FromStr for DesignMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staged" => Ok(DesignMode::Staged),
            "single" => Ok(DesignMode::Single),
            _ => Err(format!(
                "Unknown design mode: {}. Valid values: staged, single",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub mode: DesignMode,
}

// =============================================================================
// Prompts Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory of `*.md` files overriding the built-in prompts
    pub dir: Option<PathBuf>,

    /// README substituted into the general prompt
    pub readme: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: None,
            readme: PathBuf::from(constants::prompts::DEFAULT_README),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.chat.history_window, 4);
        assert_eq!(config.chat.classifier, ClassifierKind::Llm);
        assert_eq!(config.design.mode, DesignMode::Staged);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(matches!(config.validate(), Err(SublangError::Config(_))));

        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.max_tokens = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.provider = "gemini".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.fallback_provider = Some("nope".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_kind() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!("claude".parse::<ProviderKind>(), Ok(ProviderKind::Anthropic));
        assert_eq!(ProviderKind::Ollama.to_string(), "ollama");
        assert!(ProviderKind::OpenAi.requires_api_key());
        assert!(!ProviderKind::Ollama.requires_api_key());
        assert_eq!(ProviderKind::Anthropic.api_key_env(), Some("ANTHROPIC_API_KEY"));
        assert_eq!(ProviderKind::Ollama.api_key_env(), None);
    }

    #[test]
    fn test_design_mode() {
        assert_eq!("single".parse::<DesignMode>().unwrap(), DesignMode::Single);
        assert_eq!(DesignMode::Staged.to_string(), "staged");
        assert!("parallel".parse::<DesignMode>().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
model = "gpt-4o"

[chat]
classifier = "keyword"
"#,
        )
        .unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.chat.classifier, ClassifierKind::Keyword);
        assert_eq!(config.chat.history_window, 4);
    }
}
