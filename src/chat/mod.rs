//! Conversation Routing
//!
//! Each turn is classified, then answered by either the general responder
//! or the design specification pipeline. Every stage is a single LLM call
//! that falls back to a fixed reply on failure, so a turn always produces a
//! response.

pub mod assistant;
pub mod classifier;
pub mod design;
pub mod general;
pub mod stage;
pub mod state;

pub use assistant::Assistant;
pub use classifier::{Classification, Confidence, IntentClassifier, classify_keywords};
pub use design::{DesignPipeline, DesignState};
pub use stage::StageRunner;
pub use state::{ChatOutcome, ChatState};
