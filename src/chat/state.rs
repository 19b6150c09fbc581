//! Conversation state threaded through one assistant turn.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{History, Intent};

/// Context key for the classifier's confidence label
pub const CLASSIFICATION_CONFIDENCE: &str = "classification_confidence";

/// Working state for one turn
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub message: String,
    pub history: History,
    pub intent: Option<Intent>,
    pub response: String,
    /// Free-form annotations added by stages
    pub context: BTreeMap<String, String>,
}

impl ChatState {
    pub fn new(message: impl Into<String>, history: History) -> Self {
        Self {
            message: message.into(),
            history,
            ..Default::default()
        }
    }

    pub fn into_outcome(self) -> ChatOutcome {
        ChatOutcome {
            response: self.response,
            intent: self.intent.unwrap_or_default(),
            history: self.history,
            context: self.context,
        }
    }
}

/// Result of one assistant turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub intent: Intent,
    pub history: History,
    pub context: BTreeMap<String, String>,
}
