//! Session Metrics Collection
//!
//! Tracks LLM API usage and latency for a chat session, both in total and per
//! chat stage (classifier, general responder, each design stage).
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = MetricsCollector::new("session-123");
//! metrics.record_response("extract_terms", &response);
//! println!("{}", metrics.summary().display());
//! ```

use crate::ai::provider::LlmResponse;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

// =============================================================================
// Metrics Collector
// =============================================================================

/// Thread-safe metrics collector for a chat session.
///
/// Atomic counters for totals, RwLock for the per-stage table.
pub struct MetricsCollector {
    session_id: String,
    start_time: Instant,
    api_calls: AtomicU32,
    failures: AtomicU32,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
    /// Per-stage metrics in first-seen order
    stages: RwLock<Vec<StageMetrics>>,
}

/// Metrics for one chat stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageMetrics {
    pub name: String,
    pub api_calls: u32,
    pub failures: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub latency_ms: u64,
}

/// Summary statistics for a session
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub session_id: String,
    pub total_duration_ms: u64,
    pub api_calls: u32,
    pub failures: u32,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
    pub stages: Vec<StageMetrics>,
}

impl MetricsCollector {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            start_time: Instant::now(),
            api_calls: AtomicU32::new(0),
            failures: AtomicU32::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            stages: RwLock::new(Vec::new()),
        }
    }

    /// Record a successful LLM call made by `stage`
    pub fn record_response(&self, stage: &str, response: &LlmResponse) {
        let input = response.usage.input_tokens as u64;
        let output = response.usage.output_tokens as u64;
        let latency = response.timing.total_ms;

        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.input_tokens.fetch_add(input, Ordering::Relaxed);
        self.output_tokens.fetch_add(output, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency, Ordering::Relaxed);

        self.update_stage(stage, |s| {
            s.api_calls += 1;
            s.input_tokens += input;
            s.output_tokens += output;
            s.latency_ms += latency;
        });
    }

    /// Record a failed LLM call made by `stage`
    pub fn record_failure(&self, stage: &str, latency_ms: u64) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        self.update_stage(stage, |s| {
            s.api_calls += 1;
            s.failures += 1;
            s.latency_ms += latency_ms;
        });
    }

    fn update_stage(&self, stage: &str, update: impl FnOnce(&mut StageMetrics)) {
        let mut stages = self.stages.write().unwrap_or_else(|poisoned| {
            tracing::error!("Metrics stages RwLock poisoned, recovering");
            poisoned.into_inner()
        });

        match stages.iter_mut().find(|s| s.name == stage) {
            Some(existing) => update(existing),
            None => {
                let mut created = StageMetrics {
                    name: stage.to_string(),
                    ..Default::default()
                };
                update(&mut created);
                stages.push(created);
            }
        }
    }

    /// Get current metrics snapshot
    pub fn summary(&self) -> MetricsSummary {
        let api_calls = self.api_calls.load(Ordering::Relaxed);
        let input_tokens = self.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.output_tokens.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let avg_latency = if api_calls > 0 {
            total_latency as f64 / api_calls as f64
        } else {
            0.0
        };

        let stages = self
            .stages
            .read()
            .unwrap_or_else(|poisoned| {
                tracing::error!("Metrics stages RwLock poisoned on read, recovering");
                poisoned.into_inner()
            })
            .clone();

        MetricsSummary {
            session_id: self.session_id.clone(),
            total_duration_ms: self.start_time.elapsed().as_millis() as u64,
            api_calls,
            failures: self.failures.load(Ordering::Relaxed),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms: avg_latency,
            stages,
        }
    }
}

impl MetricsSummary {
    /// Format summary for display
    pub fn display(&self) -> String {
        let mut out = format!(
            "Session: {}\n\
             Duration: {:.1}s\n\
             API Calls: {} ({} failed)\n\
             Tokens: {} (input: {}, output: {})\n\
             Avg Latency: {:.0}ms",
            self.session_id,
            self.total_duration_ms as f64 / 1000.0,
            self.api_calls,
            self.failures,
            self.total_tokens,
            self.input_tokens,
            self.output_tokens,
            self.avg_latency_ms,
        );

        for stage in &self.stages {
            out.push_str(&format!(
                "\n  {:<18} calls: {:>3}  tokens: {:>6}  latency: {:>6}ms",
                stage.name,
                stage.api_calls,
                stage.input_tokens + stage.output_tokens,
                stage.latency_ms
            ));
        }
        out
    }
}

// =============================================================================
// Shared Type
// =============================================================================

/// Shared metrics collector for chat stages
pub type SharedMetrics = Arc<MetricsCollector>;

pub fn create_shared_metrics(session_id: impl Into<String>) -> SharedMetrics {
    Arc::new(MetricsCollector::new(session_id))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ResponseMetadata, ResponseTiming, TokenUsage};

    fn response(input: u32, output: u32, ms: u64) -> LlmResponse {
        LlmResponse::with_metrics(
            "ok".to_string(),
            TokenUsage::from_openai(input, output),
            ResponseTiming { total_ms: ms },
            ResponseMetadata {
                model: "gpt-4o-mini".to_string(),
                provider: "openai".to_string(),
            },
        )
    }

    #[test]
    fn test_record_response() {
        let metrics = MetricsCollector::new("test-session");
        metrics.record_response("general", &response(100, 50, 500));

        let summary = metrics.summary();
        assert_eq!(summary.api_calls, 1);
        assert_eq!(summary.input_tokens, 100);
        assert_eq!(summary.output_tokens, 50);
        assert_eq!(summary.total_tokens, 150);
        assert!((summary.avg_latency_ms - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stages_aggregate_in_order() {
        let metrics = MetricsCollector::new("stages");
        metrics.record_response("classify_intent", &response(10, 2, 100));
        metrics.record_response("extend_scenarios", &response(200, 80, 900));
        metrics.record_response("classify_intent", &response(12, 2, 120));
        metrics.record_failure("extract_terms", 30);

        let summary = metrics.summary();
        assert_eq!(summary.api_calls, 4);
        assert_eq!(summary.failures, 1);

        let names: Vec<_> = summary.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["classify_intent", "extend_scenarios", "extract_terms"]);
        assert_eq!(summary.stages[0].api_calls, 2);
        assert_eq!(summary.stages[0].input_tokens, 22);
        assert_eq!(summary.stages[2].failures, 1);
    }

    #[test]
    fn test_concurrent_recording() {
        use std::thread;

        let metrics = create_shared_metrics("concurrent-test");

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..100 {
                        m.record_response("general", &response(10, 5, 50));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let summary = metrics.summary();
        assert_eq!(summary.api_calls, 1000);
        assert_eq!(summary.input_tokens, 10000);
        assert_eq!(summary.stages.len(), 1);
        assert_eq!(summary.stages[0].api_calls, 1000);
    }

    #[test]
    fn test_summary_display() {
        let metrics = MetricsCollector::new("display-test");
        metrics.record_response("add_features", &response(1000, 500, 1000));

        let display = metrics.summary().display();
        assert!(display.contains("display-test"));
        assert!(display.contains("1500"));
        assert!(display.contains("add_features"));
    }
}
