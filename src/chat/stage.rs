//! Stage Runner
//!
//! Every chat stage is one LLM call with the same surrounding work: bound the
//! call with the request timeout, log the outcome with its duration, and
//! record usage against the stage in the session metrics. Stages decide on
//! their own fallback text; the runner only reports success or failure.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::ai::metrics::SharedMetrics;
use crate::ai::provider::{ModelParams, SharedProvider};
use crate::ai::timeout::with_timeout;
use crate::types::{ChatMessage, Result};

/// Shared execution context for chat stages
#[derive(Clone)]
pub struct StageRunner {
    provider: SharedProvider,
    params: ModelParams,
    timeout: Duration,
    metrics: SharedMetrics,
}

impl StageRunner {
    pub fn new(
        provider: SharedProvider,
        params: ModelParams,
        timeout: Duration,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            provider,
            params,
            timeout,
            metrics,
        }
    }

    /// Send `messages` to the provider on behalf of `stage`, returning the reply text
    pub async fn run(&self, stage: &str, messages: &[ChatMessage]) -> Result<String> {
        let start = Instant::now();
        debug!("{}: sending {} message(s)", stage, messages.len());

        let outcome = with_timeout(
            self.timeout,
            self.provider.complete(messages, &self.params),
            stage,
        )
        .await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(response) => {
                self.metrics.record_response(stage, &response);
                debug!(
                    "{}: completed in {:?} ({} tokens)",
                    stage,
                    elapsed,
                    response.usage.total()
                );
                Ok(response.content)
            }
            Err(e) => {
                self.metrics.record_failure(stage, elapsed.as_millis() as u64);
                warn!("{}: failed after {:?}: {}", stage, elapsed, e);
                Err(e)
            }
        }
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn model(&self) -> &str {
        &self.params.model
    }
}
