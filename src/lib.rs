//! SubLang - Conversational Design Specification Assistant
//!
//! Routes each chat message through an intent classifier to either a general
//! conversational responder or a staged design pipeline that elaborates a
//! rough idea into a specification:
//!
//! ```text
//! scenarios → terms → features → constraints
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use sublang::{Assistant, ConfigLoader, History};
//!
//! let config = ConfigLoader::load()?;
//! let assistant = Assistant::new(&config)?;
//! let outcome = assistant.chat("I want to build a library system", &History::new()).await?;
//! println!("{}\n(Intent: {})", outcome.response, outcome.intent);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: LLM providers, prompt templates, metrics, timeouts
//! - [`chat`]: intent classification, general responder, design pipeline
//! - [`config`]: layered configuration
//! - [`cli`]: interactive shell and subcommands

pub mod ai;
pub mod chat;
pub mod cli;
pub mod config;
pub mod constants;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader, DesignMode};

// Error Types
pub use types::error::{ErrorCategory, LlmError, Result, SublangError};

// Conversation
pub use chat::{Assistant, ChatOutcome};
pub use types::{ChatMessage, History, Intent, Role, SessionId};

pub use ai::{
    LlmProvider, LlmResponse, MetricsCollector, PromptLoader, ProviderChain, ProviderChainBuilder,
    SharedMetrics, TimeoutConfig, with_timeout,
};
