//! CLI Common Utilities
//!
//! Shared config loading and credential checks for command handlers.

use super::ui::Output;
use crate::ai::preflight::PreflightCheck;
use crate::chat::Assistant;
use crate::config::{Config, ConfigLoader, ProviderKind};
use crate::constants::llm::API_KEY_ENV_VARS;
use crate::types::{Result, SublangError};

/// LLM settings given as global CLI flags
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl LlmOverrides {
    /// Apply the flags on top of a loaded config and re-validate it
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(provider) = &self.provider {
            let kind: ProviderKind = provider.parse().map_err(SublangError::Config)?;
            config.llm.provider = kind.to_string();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        config.validate()
    }
}

/// Command execution context
pub struct CommandContext {
    pub config: Config,
}

impl CommandContext {
    /// Load the layered config with CLI overrides applied
    pub fn load(overrides: &LlmOverrides) -> Result<Self> {
        let mut config = ConfigLoader::load()?;
        overrides.apply(&mut config)?;
        Ok(Self { config })
    }

    /// Fail unless every configured provider has an API key.
    ///
    /// Prints the recognized environment variables before returning the error.
    pub fn require_credentials(&self) -> Result<()> {
        let result = PreflightCheck::check_credentials(&self.config.llm);
        if result.passed {
            return Ok(());
        }

        let output = Output::new();
        for error in &result.errors {
            output.error(error);
        }
        println!("Please set one of the following environment variables:");
        for (provider, var) in API_KEY_ENV_VARS {
            println!("  - {} ({})", var, provider);
        }
        println!("Or set llm.api_key in .sublang/config.toml, or use --provider ollama.");

        Err(SublangError::MissingCredentials(result.errors.join("; ")))
    }

    pub fn assistant(&self) -> Result<Assistant> {
        Assistant::new(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let mut config = Config::default();
        let overrides = LlmOverrides {
            provider: Some("claude".to_string()),
            model: Some("claude-sonnet-4-5".to_string()),
        };
        overrides.apply(&mut config).unwrap();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.model, "claude-sonnet-4-5");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::default();
        let overrides = LlmOverrides {
            provider: Some("skynet".to_string()),
            model: None,
        };
        assert!(matches!(
            overrides.apply(&mut config),
            Err(SublangError::Config(_))
        ));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = Config::default();
        LlmOverrides::default().apply(&mut config).unwrap();
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }
}
