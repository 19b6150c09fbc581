//! Assistant Orchestration
//!
//! One turn is a two-step graph:
//!
//! ```text
//! classify ──┬── GENERAL      → general responder
//!            └── DESIGN_SPECS → design pipeline
//! ```
//!
//! The caller's history is never mutated; every turn returns the updated
//! history in its [`ChatOutcome`].

use std::sync::RwLock;

use tracing::{debug, info};

use super::classifier::IntentClassifier;
use super::design::DesignPipeline;
use super::general;
use super::stage::StageRunner;
use super::state::{ChatOutcome, ChatState};
use crate::ai::metrics::{SharedMetrics, create_shared_metrics};
use crate::ai::prompt::PromptLoader;
use crate::ai::provider::{ModelParams, SharedProvider, build_provider};
use crate::ai::timeout::TimeoutConfig;
use crate::config::Config;
use crate::types::{History, Intent, Result, SessionId, SublangError};

pub struct Assistant {
    session_id: SessionId,
    runner: StageRunner,
    prompts: RwLock<PromptLoader>,
    classifier: IntentClassifier,
    design: DesignPipeline,
    history_window: usize,
}

impl Assistant {
    /// Build the provider chain and prompt registry described by `config`
    pub fn new(config: &Config) -> Result<Self> {
        let provider = build_provider(&config.llm)?;
        let prompts = PromptLoader::new(&config.prompts)?;
        Ok(Self::with_provider(config, provider, prompts))
    }

    pub fn with_provider(config: &Config, provider: SharedProvider, prompts: PromptLoader) -> Self {
        let session_id = SessionId::generate();
        let metrics = create_shared_metrics(session_id.as_str());
        let timeouts = TimeoutConfig::from_llm(&config.llm);

        info!(
            "Session {} using {} ({} classifier, {} design mode)",
            session_id.short(),
            config.llm.model,
            config.chat.classifier,
            config.design.mode
        );

        Self {
            session_id,
            runner: StageRunner::new(
                provider,
                ModelParams::from_config(&config.llm),
                timeouts.llm_request,
                metrics,
            ),
            prompts: RwLock::new(prompts),
            classifier: IntentClassifier::new(config.chat.classifier),
            design: DesignPipeline::new(config.design.mode, config.chat.history_window),
            history_window: config.chat.history_window,
        }
    }

    /// Answer one user message given the conversation so far
    pub async fn chat(&self, message: &str, history: &History) -> Result<ChatOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SublangError::InvalidInput("message is empty".to_string()));
        }

        let prompts = self.prompt_snapshot();
        let mut state = ChatState::new(message, history.clone());

        let classification = self
            .classifier
            .classify(&self.runner, &prompts, message, history)
            .await;
        classification.apply(&mut state);

        match classification.intent {
            Intent::General => {
                general::respond(&self.runner, &prompts, &mut state, self.history_window).await
            }
            Intent::DesignSpecs => self.design.run(&self.runner, &prompts, &mut state).await,
        }

        debug!(
            "Turn complete: intent={}, history={} entries",
            classification.intent,
            state.history.len()
        );
        Ok(state.into_outcome())
    }

    /// Re-read prompt overrides from disk, returning the number of loaded keys
    pub fn reload_prompts(&self) -> Result<usize> {
        let mut prompts = self
            .prompts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        prompts.reload()?;
        info!("Reloaded {} prompts", prompts.keys().len());
        Ok(prompts.keys().len())
    }

    /// Copy of the current prompt registry, so no lock is held across calls
    pub fn prompt_snapshot(&self) -> PromptLoader {
        self.prompts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn metrics(&self) -> &SharedMetrics {
        self.runner.metrics()
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn model(&self) -> &str {
        self.runner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::general::GENERAL_ERROR_RESPONSE;
    use crate::chat::stage::testing::*;
    use crate::chat::state::CLASSIFICATION_CONFIDENCE;
    use crate::config::{ClassifierKind, DesignMode};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn assistant(provider: Arc<ScriptedProvider>, config: Config) -> Assistant {
        Assistant::with_provider(&config, provider, PromptLoader::embedded_only())
    }

    #[tokio::test]
    async fn test_general_turn() {
        let provider = ScriptedProvider::new(vec![text("GENERAL"), text("Hi! How can I help?")]);
        let assistant = assistant(provider.clone(), Config::default());
        let history = History::new();

        let outcome = assistant.chat("hello", &history).await.unwrap();

        assert_eq!(outcome.intent, Intent::General);
        assert_eq!(outcome.response, "Hi! How can I help?");
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(outcome.context[CLASSIFICATION_CONFIDENCE], "high");
        // caller's history untouched
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_design_turn() {
        let provider = ScriptedProvider::new(vec![
            text("DESIGN_SPECS"),
            text("scenarios"),
            text("terms"),
            text("features"),
            text("the finished design"),
        ]);
        let assistant = assistant(provider.clone(), Config::default());

        let outcome = assistant
            .chat("I want to build a library system", &History::new())
            .await
            .unwrap();

        assert_eq!(outcome.intent, Intent::DesignSpecs);
        assert_eq!(outcome.response, "the finished design");
        // the extended scenarios stand in for the user's message
        assert_eq!(outcome.history.entries()[0].content, "scenarios");
        assert_eq!(provider.calls().len(), 5);

        let stages: Vec<_> = assistant
            .metrics()
            .summary()
            .stages
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            stages,
            [
                "classify_intent",
                "extend_scenarios",
                "extract_terms",
                "add_features",
                "add_constraints"
            ]
        );
    }

    #[tokio::test]
    async fn test_follow_up_sees_previous_reply() {
        let provider = ScriptedProvider::new(vec![
            text("GENERAL"),
            text("first reply"),
            text("GENERAL"),
            text("second reply"),
        ]);
        let assistant = assistant(provider.clone(), Config::default());

        let first = assistant.chat("hi", &History::new()).await.unwrap();
        let second = assistant.chat("thanks", &first.history).await.unwrap();

        assert_eq!(second.history.len(), 4);
        let classifier_call = &provider.calls()[2];
        assert!(
            classifier_call[1]
                .content
                .starts_with("Previous assistant response: first reply")
        );
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back_to_general() {
        let provider = ScriptedProvider::new(vec![Reply::Fail, text("general answer")]);
        let assistant = assistant(provider, Config::default());

        let outcome = assistant.chat("design a CRM", &History::new()).await.unwrap();
        assert_eq!(outcome.intent, Intent::General);
        assert_eq!(outcome.response, "general answer");
        assert_eq!(outcome.context[CLASSIFICATION_CONFIDENCE], "low");
    }

    #[tokio::test]
    async fn test_timeout_becomes_stage_failure() {
        let provider = ScriptedProvider::new(vec![text("GENERAL"), Reply::Hang]);
        let mut config = Config::default();
        config.llm.timeout_secs = 1;
        let assistant = assistant(provider, config);

        let outcome = assistant.chat("hello", &History::new()).await.unwrap();
        assert_eq!(outcome.response, GENERAL_ERROR_RESPONSE);
    }

    #[tokio::test]
    async fn test_keyword_single_mode() {
        let provider = ScriptedProvider::new(vec![text("one-shot design")]);
        let mut config = Config::default();
        config.chat.classifier = ClassifierKind::Keyword;
        config.design.mode = DesignMode::Single;
        let assistant = assistant(provider.clone(), config);

        let outcome = assistant
            .chat("Plan the architecture of a game server", &History::new())
            .await
            .unwrap();
        assert_eq!(outcome.intent, Intent::DesignSpecs);
        assert_eq!(outcome.response, "one-shot design");
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let assistant = assistant(ScriptedProvider::new(vec![]), Config::default());
        let result = assistant.chat("   ", &History::new()).await;
        assert!(matches!(result, Err(SublangError::InvalidInput(_))));
    }

    #[test]
    fn test_reload_prompts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("overall.md"), "v1").unwrap();
        let loader =
            PromptLoader::with_paths(Some(dir.path().to_path_buf()), dir.path().join("README.md"))
                .unwrap();
        let assistant = Assistant::with_provider(
            &Config::default(),
            ScriptedProvider::new(vec![]),
            loader,
        );

        fs::write(dir.path().join("overall.md"), "v2").unwrap();
        fs::write(dir.path().join("extra.md"), "more").unwrap();
        assert_eq!(assistant.reload_prompts().unwrap(), 9);
        assert_eq!(assistant.prompt_snapshot().get("OVERALL"), "v2");
    }
}
