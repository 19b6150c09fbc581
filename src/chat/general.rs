//! General conversational responder.

use tracing::debug;

use super::stage::StageRunner;
use super::state::ChatState;
use crate::ai::prompt::{PromptLoader, keys};
use crate::constants::chat::ERROR_HISTORY_ENTRY;
use crate::types::ChatMessage;

pub const GENERAL_ERROR_RESPONSE: &str =
    "I apologize, but I encountered an error while processing your request. Please try again.";

const STAGE: &str = "general";

/// Answer `state.message` with the general prompt and recent history
pub async fn respond(
    runner: &StageRunner,
    prompts: &PromptLoader,
    state: &mut ChatState,
    history_window: usize,
) {
    let mut messages = vec![ChatMessage::system(prompts.get(keys::GENERAL))];
    messages.extend_from_slice(state.history.recent(history_window));
    messages.push(ChatMessage::user(state.message.clone()));

    match runner.run(STAGE, &messages).await {
        Ok(reply) => {
            debug!("General response ready ({} chars)", reply.len());
            state
                .history
                .record_exchange(state.message.clone(), reply.clone());
            state.response = reply;
        }
        Err(_) => {
            state
                .history
                .record_exchange(state.message.clone(), ERROR_HISTORY_ENTRY);
            state.response = GENERAL_ERROR_RESPONSE.to_string();
        }
    }
}
