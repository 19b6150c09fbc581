//! Fallback Provider Chain
//!
//! Cascading provider attempts with retry and backoff.
//!
//! ## Strategy
//!
//! 1. Try the provider, addressing the request to that provider's own model
//! 2. On failure, classify the error
//! 3. If rate-limited, wait for the provider's retry hint and retry
//! 4. If network/transient, retry with exponential backoff and jitter
//! 5. If auth/unavailable/token-limit, move to the next provider
//! 6. If the request itself is bad, stop the chain
//! 7. Continue until success, all providers are exhausted, or the attempt cap is hit

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::constants::chain as chain_constants;

use super::{LlmProvider, LlmResponse, ModelParams, SharedProvider};
use crate::types::{ChatMessage, ErrorCategory, ErrorClassifier, Result, SublangError};

/// Provider with retry budget for chain routing
#[derive(Clone)]
pub struct ChainedProvider {
    pub provider: SharedProvider,
    /// Maximum attempts for this provider
    pub max_retries: u8,
}

impl ChainedProvider {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            max_retries: chain_constants::DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

/// Configuration for the provider chain
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Maximum total attempts across all providers
    pub max_total_attempts: usize,
    /// Base delay for exponential backoff
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_factor: f32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_total_attempts: chain_constants::MAX_TOTAL_ATTEMPTS,
            base_delay: Duration::from_millis(chain_constants::BASE_DELAY_MS),
            max_delay: Duration::from_secs(chain_constants::MAX_DELAY_SECS),
            backoff_factor: chain_constants::BACKOFF_FACTOR,
        }
    }
}

/// Fallback provider chain with cascading attempts
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<ChainedProvider>,
    config: ChainConfig,
}

impl ProviderChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            providers: Vec::new(),
            config,
        }
    }

    /// Add a provider to the end of the chain
    pub fn add_provider(mut self, provider: ChainedProvider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Execute with fallback chain
    #[instrument(skip(self, messages, params), fields(providers = self.providers.len()))]
    pub async fn execute(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<LlmResponse> {
        let mut total_attempts = 0;
        let start_time = Instant::now();

        if self.providers.is_empty() {
            return Err(SublangError::Config(
                "No providers configured in chain".to_string(),
            ));
        }

        let mut last_error: Option<SublangError> = None;

        for provider_entry in &self.providers {
            let provider = &provider_entry.provider;
            let provider_name = provider.name().to_string();
            let provider_params = params.for_model(provider.model());
            let mut current_delay = self.config.base_delay;

            for attempt in 1..=provider_entry.max_retries {
                if total_attempts >= self.config.max_total_attempts {
                    break;
                }

                total_attempts += 1;

                debug!(
                    total_attempt = total_attempts,
                    max_attempts = self.config.max_total_attempts,
                    provider = %provider_name,
                    attempt = attempt,
                    max_retries = provider_entry.max_retries,
                    "Chain attempt"
                );

                match provider.complete(messages, &provider_params).await {
                    Ok(response) => {
                        debug!(
                            provider = %provider_name,
                            attempts = total_attempts,
                            elapsed_ms = start_time.elapsed().as_millis() as u64,
                            "Chain succeeded"
                        );
                        return Ok(response);
                    }
                    Err(err) => {
                        let classified = ErrorClassifier::classify_error(&err, &provider_name);

                        warn!(
                            provider = %provider_name,
                            attempt = attempt,
                            error = %err,
                            category = %classified.category,
                            "Provider failed"
                        );

                        last_error = Some(err);
                        let has_retry_left = attempt < provider_entry.max_retries;

                        match classified.category {
                            ErrorCategory::Auth
                            | ErrorCategory::TokenLimit
                            | ErrorCategory::Unavailable => {
                                info!(
                                    provider = %provider_name,
                                    category = %classified.category,
                                    "Trying next provider"
                                );
                                break;
                            }
                            ErrorCategory::BadRequest => {
                                warn!("Bad request error, stopping chain");
                                return Err(last_error.unwrap_or_else(|| {
                                    SublangError::LlmApi(
                                        "Bad request with unknown error".to_string(),
                                    )
                                }));
                            }
                            ErrorCategory::RateLimit if has_retry_left => {
                                let wait = classified
                                    .retry_after
                                    .or_else(|| parse_rate_limit_delay(&classified.message))
                                    .unwrap_or_else(|| classified.recommended_delay())
                                    .min(self.config.max_delay);
                                info!(
                                    wait_secs = wait.as_secs(),
                                    "Rate limited, waiting before retry"
                                );
                                tokio::time::sleep(wait).await;
                            }
                            ErrorCategory::Network
                            | ErrorCategory::Transient
                            | ErrorCategory::Unknown
                                if has_retry_left =>
                            {
                                let delay = current_delay + random_jitter(current_delay);
                                debug!(delay_ms = delay.as_millis(), "Retrying after backoff");
                                tokio::time::sleep(delay).await;
                                current_delay = calculate_backoff(
                                    current_delay,
                                    self.config.backoff_factor,
                                    self.config.max_delay,
                                );
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        warn!(
            attempts = total_attempts,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "All providers in chain failed"
        );

        Err(last_error
            .unwrap_or_else(|| SublangError::LlmApi("All providers in chain failed".to_string())))
    }
}

#[async_trait]
impl LlmProvider for ProviderChain {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<LlmResponse> {
        self.execute(messages, params).await
    }

    fn name(&self) -> &str {
        "provider-chain"
    }

    fn model(&self) -> &str {
        self.providers
            .first()
            .map(|p| p.provider.model())
            .unwrap_or("unknown")
    }

    async fn health_check(&self) -> Result<bool> {
        for provider in &self.providers {
            if provider.provider.health_check().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Parse rate limit delay from error message
///
/// Extracts retry-after seconds from common rate limit error formats.
fn parse_rate_limit_delay(message: &str) -> Option<Duration> {
    let lower = message.to_lowercase();

    // "retry after N seconds" or "retry-after: N"
    if let Some(idx) = lower.find("retry") {
        let after_retry = &lower[idx..];
        for word in after_retry.split_whitespace() {
            if let Ok(secs) = word.trim_end_matches(['s', '.', ',']).parse::<u64>() {
                return Some(Duration::from_secs(secs.min(300)));
            }
        }
    }

    // "try again in N seconds" or "wait N seconds"
    for pattern in &["wait ", "in "] {
        if let Some(idx) = lower.find(pattern) {
            let after_pattern = &lower[idx + pattern.len()..];
            for word in after_pattern.split_whitespace() {
                if let Ok(secs) = word.trim_end_matches(['s', '.', ',']).parse::<u64>() {
                    return Some(Duration::from_secs(secs.min(300)));
                }
            }
        }
    }

    None
}

/// Random jitter of up to a quarter of the base delay
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

/// Calculate exponential backoff with cap
fn calculate_backoff(current: Duration, factor: f32, max: Duration) -> Duration {
    let next = Duration::from_secs_f32(current.as_secs_f32() * factor);
    std::cmp::min(next, max)
}

/// Builder for creating provider chains
pub struct ProviderChainBuilder {
    providers: Vec<ChainedProvider>,
    config: ChainConfig,
}

impl ProviderChainBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            config: ChainConfig::default(),
        }
    }

    /// Add a provider with default retry budget
    pub fn add_provider(mut self, provider: impl LlmProvider + 'static) -> Self {
        self.providers
            .push(ChainedProvider::new(std::sync::Arc::new(provider)));
        self
    }

    /// Add a shared provider with a custom retry budget
    pub fn add_shared_with_retries(mut self, provider: SharedProvider, max_retries: u8) -> Self {
        self.providers
            .push(ChainedProvider::new(provider).with_max_retries(max_retries));
        self
    }

    /// Set chain configuration
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ProviderChain {
        ProviderChain {
            providers: self.providers,
            config: self.config,
        }
    }
}

impl Default for ProviderChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LlmError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct MockProvider {
        name: String,
        model: String,
        failure: Option<ErrorCategory>,
        fail_count: AtomicU32,
        max_failures: u32,
        seen_models: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                model: format!("{}-model", name),
                failure: None,
                fail_count: AtomicU32::new(0),
                max_failures: 0,
                seen_models: Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &str, category: ErrorCategory, failures: u32) -> Self {
            Self {
                failure: Some(category),
                max_failures: failures,
                ..Self::new(name)
            }
        }

        fn calls(&self) -> u32 {
            self.fail_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            params: &ModelParams,
        ) -> Result<LlmResponse> {
            self.seen_models.lock().unwrap().push(params.model.clone());
            let count = self.fail_count.fetch_add(1, Ordering::SeqCst);
            if let Some(category) = self.failure
                && count < self.max_failures
            {
                return Err(LlmError::with_provider(category, "mock failure", &self.name).into());
            }
            Ok(LlmResponse::content_only(format!("from {}", self.name)))
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            &self.model
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.failure.is_none())
        }
    }

    fn fast_config() -> ChainConfig {
        ChainConfig {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::user("test")]
    }

    #[tokio::test]
    async fn test_chain_success_first_provider() {
        let chain = ProviderChainBuilder::new()
            .add_provider(MockProvider::new("primary"))
            .add_provider(MockProvider::new("fallback"))
            .build();

        let response = chain
            .complete(&messages(), &ModelParams::default())
            .await
            .unwrap();
        assert_eq!(response.content, "from primary");
    }

    #[tokio::test]
    async fn test_chain_uses_each_providers_model() {
        let primary = std::sync::Arc::new(MockProvider::failing("primary", ErrorCategory::Auth, 1));
        let fallback = std::sync::Arc::new(MockProvider::new("fallback"));
        let chain = ProviderChainBuilder::new()
            .add_shared_with_retries(primary.clone(), 3)
            .add_shared_with_retries(fallback.clone(), 3)
            .with_config(fast_config())
            .build();

        chain.execute(&messages(), &ModelParams::default()).await.unwrap();

        assert_eq!(*primary.seen_models.lock().unwrap(), vec!["primary-model"]);
        assert_eq!(*fallback.seen_models.lock().unwrap(), vec!["fallback-model"]);
    }

    #[tokio::test]
    async fn test_chain_fallback_on_auth_failure() {
        let primary = std::sync::Arc::new(MockProvider::failing("primary", ErrorCategory::Auth, 100));
        let chain = ProviderChainBuilder::new()
            .add_shared_with_retries(primary.clone(), 3)
            .add_provider(MockProvider::new("fallback"))
            .with_config(fast_config())
            .build();

        let response = chain
            .execute(&messages(), &ModelParams::default())
            .await
            .unwrap();

        assert_eq!(response.content, "from fallback");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_chain_retry_then_success() {
        let flaky = std::sync::Arc::new(MockProvider::failing("flaky", ErrorCategory::Transient, 2));
        let chain = ProviderChainBuilder::new()
            .add_shared_with_retries(flaky.clone(), 3)
            .with_config(fast_config())
            .build();

        let response = chain
            .execute(&messages(), &ModelParams::default())
            .await
            .unwrap();

        assert_eq!(response.content, "from flaky");
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_chain_stops_on_bad_request() {
        let chain = ProviderChainBuilder::new()
            .add_provider(MockProvider::failing("primary", ErrorCategory::BadRequest, 100))
            .add_provider(MockProvider::new("fallback"))
            .with_config(fast_config())
            .build();

        let result = chain.execute(&messages(), &ModelParams::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_chain_exhausted_returns_last_error() {
        let chain = ProviderChainBuilder::new()
            .add_shared_with_retries(
                std::sync::Arc::new(MockProvider::failing("only", ErrorCategory::Network, 100)),
                2,
            )
            .with_config(fast_config())
            .build();

        let err = chain
            .execute(&messages(), &ModelParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SublangError::Llm(ref e) if e.category == ErrorCategory::Network));
    }

    #[tokio::test]
    async fn test_chain_respects_total_attempt_cap() {
        let failing = std::sync::Arc::new(MockProvider::failing("a", ErrorCategory::Network, 100));
        let chain = ProviderChainBuilder::new()
            .add_shared_with_retries(failing.clone(), 10)
            .with_config(ChainConfig {
                max_total_attempts: 4,
                ..fast_config()
            })
            .build();

        assert!(chain.execute(&messages(), &ModelParams::default()).await.is_err());
        assert_eq!(failing.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_chain_is_config_error() {
        let chain = ProviderChain::new(ChainConfig::default());
        assert!(chain.is_empty());
        let result = chain.execute(&messages(), &ModelParams::default()).await;
        assert!(matches!(result, Err(SublangError::Config(_))));
    }

    #[test]
    fn test_random_jitter() {
        let base = Duration::from_millis(1000);
        let jitter = random_jitter(base);
        assert!(jitter <= Duration::from_millis(250));
        assert_eq!(random_jitter(Duration::from_millis(2)), Duration::ZERO);
    }

    #[test]
    fn test_calculate_backoff() {
        let current = Duration::from_millis(500);
        let next = calculate_backoff(current, 1.5, Duration::from_secs(30));
        assert_eq!(next, Duration::from_millis(750));

        let large = Duration::from_secs(25);
        let capped = calculate_backoff(large, 1.5, Duration::from_secs(30));
        assert_eq!(capped, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_rate_limit_delay() {
        let msg1 = "Rate limit exceeded. Please retry after 30 seconds.";
        assert_eq!(parse_rate_limit_delay(msg1), Some(Duration::from_secs(30)));

        let msg2 = "Too many requests. Please wait 60 seconds before trying again.";
        assert_eq!(parse_rate_limit_delay(msg2), Some(Duration::from_secs(60)));

        let msg3 = "Please try again in 20s.";
        assert_eq!(parse_rate_limit_delay(msg3), Some(Duration::from_secs(20)));

        let msg4 = "Retry after 1000 seconds";
        assert_eq!(parse_rate_limit_delay(msg4), Some(Duration::from_secs(300)));

        assert_eq!(parse_rate_limit_delay("Rate limit exceeded"), None);
    }
}
