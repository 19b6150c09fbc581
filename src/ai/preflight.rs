//! Pre-flight Validation Checks
//!
//! Validates provider setup before a session starts so a missing API key is
//! reported once, up front, instead of as a failure on every turn.
//!
//! ## Checks
//!
//! - Credentials for the primary and fallback providers
//! - Provider reachability (optional, network)

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::ai::provider::LlmProvider;
use crate::config::{LlmConfig, ProviderKind};
use crate::constants::llm::API_KEY_ENV_VARS;

/// Pre-flight check results
#[derive(Debug, Clone)]
pub struct PreflightResult {
    /// All checks passed
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Errors (blocking)
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
}

impl PreflightResult {
    pub fn new() -> Self {
        Self {
            passed: true,
            checks: Vec::new(),
            errors: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn add_check(&mut self, check: CheckResult) {
        if !check.passed {
            self.passed = false;
            self.errors.push(check.message.clone());
        }
        self.checks.push(check);
    }

    fn add_recommendation(&mut self, rec: String) {
        if !self.recommendations.contains(&rec) {
            self.recommendations.push(rec);
        }
    }
}

impl Default for PreflightResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Individual check result
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub duration_ms: u64,
}

/// Pre-flight validation checker
pub struct PreflightCheck;

impl PreflightCheck {
    /// Verify every configured provider has credentials, reading the process environment
    pub fn check_credentials(config: &LlmConfig) -> PreflightResult {
        Self::check_credentials_with(config, |var| std::env::var(var).ok())
    }

    /// Credential check with an injectable environment lookup
    pub fn check_credentials_with(
        config: &LlmConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> PreflightResult {
        let mut result = PreflightResult::new();

        let mut providers = vec![(config.provider.as_str(), true)];
        if let Some(fallback) = &config.fallback_provider {
            providers.push((fallback.as_str(), false));
        }

        for (name, is_primary) in providers {
            let kind = match name.parse::<ProviderKind>() {
                Ok(kind) => kind,
                Err(e) => {
                    result.add_check(CheckResult {
                        name: format!("credentials_{}", name),
                        passed: false,
                        message: e,
                        duration_ms: 0,
                    });
                    continue;
                }
            };

            let Some(env_var) = kind.api_key_env() else {
                result.add_check(CheckResult {
                    name: format!("credentials_{}", kind),
                    passed: true,
                    message: format!("Provider '{}' needs no API key", kind),
                    duration_ms: 0,
                });
                continue;
            };

            // The config key only belongs to the primary provider
            let config_key = is_primary.then_some(config.api_key.as_deref()).flatten();
            let present = config_key.is_some_and(|k| !k.trim().is_empty())
                || lookup(env_var).is_some_and(|k| !k.trim().is_empty());

            result.add_check(CheckResult {
                name: format!("credentials_{}", kind),
                passed: present,
                message: if present {
                    format!("API key found for '{}'", kind)
                } else {
                    format!("No API key for '{}' (set {})", kind, env_var)
                },
                duration_ms: 0,
            });

            if !present {
                for (_, var) in API_KEY_ENV_VARS {
                    result.add_recommendation(format!("export {}=...", var));
                }
            }
        }

        if result.passed {
            info!("Credential checks passed ({} checks)", result.checks.len());
        } else {
            warn!("Credential checks failed: {} errors", result.errors.len());
        }

        result
    }

    /// Check LLM provider reachability
    pub async fn check_provider_health(
        provider: &dyn LlmProvider,
        timeout: Duration,
        result: &mut PreflightResult,
    ) {
        let start = Instant::now();
        let name = format!("provider_health_{}", provider.name());

        let outcome = tokio::time::timeout(timeout, provider.health_check()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (passed, message) = match outcome {
            Ok(Ok(true)) => (true, format!("Provider '{}' is healthy", provider.name())),
            Ok(Ok(false)) => (
                false,
                format!("Provider '{}' health check returned false", provider.name()),
            ),
            Ok(Err(e)) => (
                false,
                format!("Provider '{}' health check failed: {}", provider.name(), e),
            ),
            Err(_) => (
                false,
                format!(
                    "Provider '{}' health check timed out after {:?}",
                    provider.name(),
                    timeout
                ),
            ),
        };

        if !passed {
            result.add_recommendation(
                "Check API credentials, api_base and network connectivity".to_string(),
            );
        }

        result.add_check(CheckResult {
            name,
            passed,
            message,
            duration_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{LlmResponse, ModelParams};
    use crate::types::{ChatMessage, Result};
    use async_trait::async_trait;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_openai_key_fails() {
        let config = LlmConfig::default();
        let result = PreflightCheck::check_credentials_with(&config, no_env);
        assert!(!result.passed);
        assert!(result.errors[0].contains("OPENAI_API_KEY"));
        assert!(
            result
                .recommendations
                .iter()
                .any(|r| r.contains("ANTHROPIC_API_KEY"))
        );
    }

    #[test]
    fn test_env_key_passes() {
        let config = LlmConfig::default();
        let result = PreflightCheck::check_credentials_with(&config, |var| {
            (var == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        });
        assert!(result.passed);
    }

    #[test]
    fn test_config_key_passes() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            api_key: Some("sk-ant".to_string()),
            ..Default::default()
        };
        assert!(PreflightCheck::check_credentials_with(&config, no_env).passed);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        assert!(PreflightCheck::check_credentials_with(&config, no_env).passed);
    }

    #[test]
    fn test_fallback_needs_own_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            api_key: Some("unused".to_string()),
            fallback_provider: Some("anthropic".to_string()),
            ..Default::default()
        };
        let result = PreflightCheck::check_credentials_with(&config, no_env);
        assert!(!result.passed);
        assert_eq!(result.checks.len(), 2);
    }

    struct StaticHealth(bool);

    #[async_trait]
    impl LlmProvider for StaticHealth {
        async fn complete(&self, _: &[ChatMessage], _: &ModelParams) -> Result<LlmResponse> {
            Ok(LlmResponse::content_only(""))
        }
        fn name(&self) -> &str {
            "static"
        }
        fn model(&self) -> &str {
            "static-model"
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_provider_health() {
        let mut result = PreflightResult::new();
        PreflightCheck::check_provider_health(
            &StaticHealth(true),
            Duration::from_secs(1),
            &mut result,
        )
        .await;
        assert!(result.passed);

        PreflightCheck::check_provider_health(
            &StaticHealth(false),
            Duration::from_secs(1),
            &mut result,
        )
        .await;
        assert!(!result.passed);
        assert_eq!(result.checks.len(), 2);
        assert_eq!(result.recommendations.len(), 1);
    }
}
