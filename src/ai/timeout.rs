//! Timeout Configuration
//!
//! Every LLM call made by a chat stage is wrapped in [`with_timeout`], so a
//! hung provider turns into an ordinary stage failure.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{TimeoutConfig, with_timeout};
//!
//! let config = TimeoutConfig::from_llm(&llm_config);
//! let reply = with_timeout(
//!     config.llm_request,
//!     provider.complete(&messages, &params),
//!     "extend_scenarios"
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::constants::network as net_constants;
use crate::types::{Result, SublangError};

/// Timeouts applied around provider calls
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Whole-call budget for one completion, retries included
    pub llm_request: Duration,
    /// Budget for a provider health check
    pub health_check: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            health_check: Duration::from_secs(net_constants::HEALTH_CHECK_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn from_llm(config: &LlmConfig) -> Self {
        Self {
            llm_request: Duration::from_secs(config.timeout_secs),
            ..Self::default()
        }
    }
}

/// Execute an async operation with a timeout
///
/// Returns `SublangError::Timeout` if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(SublangError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_from_llm() {
        let config = LlmConfig {
            timeout_secs: 45,
            ..Default::default()
        };
        let timeouts = TimeoutConfig::from_llm(&config);
        assert_eq!(timeouts.llm_request.as_secs(), 45);
        assert_eq!(
            timeouts.health_check.as_secs(),
            net_constants::HEALTH_CHECK_TIMEOUT_SECS
        );
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, SublangError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, SublangError>(42)
            },
            "slow operation",
        )
        .await;
        match result {
            Err(SublangError::Timeout { operation, .. }) => assert_eq!(operation, "slow operation"),
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result: Result<()> = with_timeout(
            Duration::from_secs(1),
            async { Err(SublangError::LlmApi("boom".to_string())) },
            "failing operation",
        )
        .await;
        assert!(matches!(result, Err(SublangError::LlmApi(_))));
    }
}
