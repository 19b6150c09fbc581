//! Intent Classification
//!
//! Decides whether a turn goes to the general responder or the design
//! pipeline.
//!
//! - **Llm**: asks the model with the `CLASSIFY_INTENT` prompt, giving it the
//!   previous assistant reply when one exists so follow-ups stay on route.
//!   Any failure routes to `GENERAL`.
//! - **Keyword**: offline substring match, never calls the model.

use std::fmt;

use tracing::{debug, warn};

use super::stage::StageRunner;
use super::state::{CLASSIFICATION_CONFIDENCE, ChatState};
use crate::ai::prompt::{PromptLoader, keys};
use crate::config::ClassifierKind;
use crate::types::{ChatMessage, History, Intent};

/// Messages mentioning any of these are treated as design requests
pub const DESIGN_KEYWORDS: &[&str] = &[
    "design",
    "architecture",
    "requirements",
    "specification",
    "specs",
    "system design",
    "software design",
    "api design",
    "database design",
    "plan",
    "structure",
    "blueprint",
    "schema",
    "model",
];

const STAGE: &str = "classify_intent";

/// How sure the classifier is about its route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: Confidence,
}

impl Classification {
    fn new(intent: Intent, confidence: Confidence) -> Self {
        Self { intent, confidence }
    }

    /// Store the route and confidence on the turn state
    pub fn apply(&self, state: &mut ChatState) {
        state.intent = Some(self.intent);
        state.context.insert(
            CLASSIFICATION_CONFIDENCE.to_string(),
            self.confidence.to_string(),
        );
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    kind: ClassifierKind,
}

impl IntentClassifier {
    pub fn new(kind: ClassifierKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    pub async fn classify(
        &self,
        runner: &StageRunner,
        prompts: &PromptLoader,
        message: &str,
        history: &History,
    ) -> Classification {
        let classification = match self.kind {
            ClassifierKind::Keyword => classify_keywords(message),
            ClassifierKind::Llm => classify_with_llm(runner, prompts, message, history).await,
        };
        debug!(
            "Classified as {} ({} confidence, {})",
            classification.intent, classification.confidence, self.kind
        );
        classification
    }
}

/// Offline keyword route
pub fn classify_keywords(message: &str) -> Classification {
    let lowered = message.to_lowercase();
    if DESIGN_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        Classification::new(Intent::DesignSpecs, Confidence::High)
    } else {
        Classification::new(Intent::General, Confidence::Low)
    }
}

async fn classify_with_llm(
    runner: &StageRunner,
    prompts: &PromptLoader,
    message: &str,
    history: &History,
) -> Classification {
    let messages = [
        ChatMessage::system(prompts.get(keys::CLASSIFY_INTENT)),
        ChatMessage::user(classifier_prompt(message, history)),
    ];

    match runner.run(STAGE, &messages).await {
        Ok(reply) => Classification::new(route_from_reply(&reply), Confidence::High),
        Err(e) => {
            warn!("Intent classification failed, routing to GENERAL: {}", e);
            Classification::new(Intent::General, Confidence::Low)
        }
    }
}

/// User prompt for the classifier, anchored on the last assistant reply
pub fn classifier_prompt(message: &str, history: &History) -> String {
    match history.last_assistant().filter(|last| !last.is_empty()) {
        Some(last) => format!(
            "Previous assistant response: {}\n\n\
             Current user message: {}\n\n\
             Based on the previous response and the new user message, \
             is this conversation still about software design?",
            last, message
        ),
        None => format!(
            "Current user message: {}\n\n\
             This is the first message in the conversation. Is this about software design?",
            message
        ),
    }
}

/// `DESIGN_SPECS` anywhere in the reply wins
pub fn route_from_reply(reply: &str) -> Intent {
    if reply.trim().to_uppercase().contains(Intent::DesignSpecs.as_str()) {
        Intent::DesignSpecs
    } else {
        Intent::General
    }
}
