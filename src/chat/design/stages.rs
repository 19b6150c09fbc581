//! The four staged-design steps.
//!
//! Each stage reads what the earlier ones produced, makes one call and
//! writes its output back. A failed call never aborts the pipeline: the
//! stage substitutes its own fallback and the next stage runs anyway.

use std::time::Instant;

use tracing::debug;

use super::DesignState;
use crate::ai::extract::code_block_or_text;
use crate::ai::prompt::{PromptLoader, combine_prompts, keys};
use crate::chat::stage::StageRunner;
use crate::types::ChatMessage;

pub const EXTRACT_TERMS_ERROR: &str = "I apologize, but I encountered an error while extracting terms from your description. Please try again.";
pub const ADD_FEATURES_ERROR: &str = "I apologize, but I encountered an error while adding features to your design. Please try again.";
pub const ADD_CONSTRAINTS_ERROR: &str = "I apologize, but I encountered an error while adding constraints to your design. Please try again.";

/// Expand the request into use scenarios; the result replaces `message`
pub async fn extend_scenarios(
    runner: &StageRunner,
    prompts: &PromptLoader,
    state: &mut DesignState,
    history_window: usize,
) {
    let start = Instant::now();
    let system = combine_prompts(
        &prompts.get(keys::OVERALL),
        &prompts.get(keys::EXTEND_SCENARIOS),
    );
    let mut messages = vec![ChatMessage::system(system)];
    messages.extend_from_slice(state.history.recent(history_window));
    messages.push(ChatMessage::user(state.message.clone()));

    match runner.run("extend_scenarios", &messages).await {
        Ok(reply) => {
            let scenarios = code_block_or_text(&reply);
            state.message = scenarios.clone();
            state.scenarios = Some(scenarios);
        }
        Err(_) => debug!("extend_scenarios: keeping the original description"),
    }
    debug!("extend_scenarios finished in {:?}", start.elapsed());
}

pub async fn extract_terms(
    runner: &StageRunner,
    prompts: &PromptLoader,
    state: &mut DesignState,
    history_window: usize,
) {
    let start = Instant::now();
    let mut messages = vec![ChatMessage::system(prompts.get(keys::EXTRACT_TERMS))];
    messages.extend_from_slice(state.history.recent(history_window));
    messages.push(ChatMessage::user(state.message.clone()));

    state.terms = match runner.run("extract_terms", &messages).await {
        Ok(reply) => reply,
        Err(_) => EXTRACT_TERMS_ERROR.to_string(),
    };
    debug!("extract_terms finished in {:?}", start.elapsed());
}

pub async fn add_features(runner: &StageRunner, prompts: &PromptLoader, state: &mut DesignState) {
    let start = Instant::now();
    let messages = [
        ChatMessage::system(prompts.get(keys::ADD_FEATURES)),
        ChatMessage::user(format!(
            "Original description: {}\n\nPreviously extracted terms:\n{}",
            state.message, state.terms
        )),
    ];

    state.features = match runner.run("add_features", &messages).await {
        Ok(reply) => reply,
        Err(_) => ADD_FEATURES_ERROR.to_string(),
    };
    debug!("add_features finished in {:?}", start.elapsed());
}

/// Final stage: its full reply is the turn's response and the only history write.
///
/// The recorded user entry is the working description, which holds the
/// extended scenarios whenever `extend_scenarios` succeeded.
pub async fn add_constraints(
    runner: &StageRunner,
    prompts: &PromptLoader,
    state: &mut DesignState,
) {
    let start = Instant::now();
    let messages = [
        ChatMessage::system(prompts.get(keys::ADD_CONSTRAINTS)),
        ChatMessage::user(format!(
            "Original description: {}\n\nTerms:\n{}\n\nFeatures:\n{}",
            state.message, state.terms, state.features
        )),
    ];

    state.response = match runner.run("add_constraints", &messages).await {
        Ok(reply) => reply,
        Err(_) => ADD_CONSTRAINTS_ERROR.to_string(),
    };
    state
        .history
        .record_exchange(state.message.clone(), state.response.clone());
    debug!("add_constraints finished in {:?}", start.elapsed());
}
