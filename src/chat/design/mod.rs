//! Design Specification Pipeline
//!
//! Staged mode elaborates a rough description in four strictly ordered
//! calls:
//!
//! ```text
//! extend_scenarios → extract_terms → add_features → add_constraints
//! ```
//!
//! `extend_scenarios` and `extract_terms` see recent conversation history;
//! only `add_constraints` writes to it. Single mode answers with one call
//! using the `DESIGN_SPECS` prompt.

pub mod stages;

use std::time::Instant;

use tracing::info;

use super::stage::StageRunner;
use super::state::ChatState;
use crate::ai::prompt::{PromptLoader, keys};
use crate::config::DesignMode;
use crate::constants::chat::ERROR_HISTORY_ENTRY;
use crate::types::{ChatMessage, History, Intent};

pub use stages::{ADD_CONSTRAINTS_ERROR, ADD_FEATURES_ERROR, EXTRACT_TERMS_ERROR};

pub const DESIGN_ERROR_RESPONSE: &str = "I apologize, but I encountered an error while processing your design request. Please try again.";

/// Intermediate results of the staged pipeline
#[derive(Debug, Clone, Default)]
pub struct DesignState {
    /// Working description, replaced by the extended scenarios
    pub message: String,
    pub history: History,
    pub scenarios: Option<String>,
    pub terms: String,
    pub features: String,
    pub response: String,
}

impl DesignState {
    pub fn new(message: impl Into<String>, history: History) -> Self {
        Self {
            message: message.into(),
            history,
            ..Default::default()
        }
    }
}

/// Runs design requests in the configured mode
#[derive(Debug, Clone, Copy)]
pub struct DesignPipeline {
    mode: DesignMode,
    history_window: usize,
}

impl DesignPipeline {
    pub fn new(mode: DesignMode, history_window: usize) -> Self {
        Self {
            mode,
            history_window,
        }
    }

    pub fn mode(&self) -> DesignMode {
        self.mode
    }

    /// Answer `state.message` as a design request, updating response and history
    pub async fn run(&self, runner: &StageRunner, prompts: &PromptLoader, state: &mut ChatState) {
        let start = Instant::now();
        match self.mode {
            DesignMode::Staged => {
                let mut design =
                    DesignState::new(state.message.clone(), std::mem::take(&mut state.history));
                self.run_staged(runner, prompts, &mut design).await;
                state.response = design.response;
                state.history = design.history;
            }
            DesignMode::Single => self.run_single(runner, prompts, state).await,
        }
        state.intent = Some(Intent::DesignSpecs);
        info!("Design pipeline ({}) finished in {:?}", self.mode, start.elapsed());
    }

    pub async fn run_staged(
        &self,
        runner: &StageRunner,
        prompts: &PromptLoader,
        design: &mut DesignState,
    ) {
        stages::extend_scenarios(runner, prompts, design, self.history_window).await;
        stages::extract_terms(runner, prompts, design, self.history_window).await;
        stages::add_features(runner, prompts, design).await;
        stages::add_constraints(runner, prompts, design).await;
    }

    async fn run_single(&self, runner: &StageRunner, prompts: &PromptLoader, state: &mut ChatState) {
        let mut messages = vec![ChatMessage::system(prompts.get(keys::DESIGN_SPECS))];
        messages.extend_from_slice(state.history.recent(self.history_window));
        messages.push(ChatMessage::user(state.message.clone()));

        match runner.run("design_specs", &messages).await {
            Ok(reply) => {
                state
                    .history
                    .record_exchange(state.message.clone(), reply.clone());
                state.response = reply;
            }
            Err(_) => {
                state
                    .history
                    .record_exchange(state.message.clone(), ERROR_HISTORY_ENTRY);
                state.response = DESIGN_ERROR_RESPONSE.to_string();
            }
        }
    }
}
