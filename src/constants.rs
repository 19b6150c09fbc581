//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Provider chain constants
pub mod chain {
    /// Maximum total attempts across all providers
    pub const MAX_TOTAL_ATTEMPTS: usize = 8;

    /// Default maximum retries per provider
    pub const DEFAULT_MAX_RETRIES: u8 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds)
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// LLM defaults
pub mod llm {
    pub const DEFAULT_PROVIDER: &str = "openai";

    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

    pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

    /// Pinned Messages API version header
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";

    /// Anthropic requires max_tokens on every request
    pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

    pub const OLLAMA_API_BASE: &str = "http://localhost:11434";

    /// Environment variables recognized as provider credentials
    pub const API_KEY_ENV_VARS: &[(&str, &str)] = &[
        ("openai", "OPENAI_API_KEY"),
        ("anthropic", "ANTHROPIC_API_KEY"),
    ];
}

/// Conversation constants
pub mod chat {
    /// History entries handed to the responders (two user/assistant rounds)
    pub const DEFAULT_HISTORY_WINDOW: usize = 4;

    /// Placeholder recorded in history when a responder fails
    pub const ERROR_HISTORY_ENTRY: &str = "Error occurred";

    /// Words ending a session in the interactive shell
    pub const EXIT_WORDS: &[&str] = &["quit", "exit"];

    /// Consecutive empty lines that terminate multi-line input
    pub const INPUT_TERMINATOR_LINES: usize = 2;
}

/// Prompt constants
pub mod prompts {
    /// Separator between the shared preamble and a stage prompt
    pub const COMBINE_SEPARATOR: &str = "\n\n---\n\n";

    /// Placeholder in the general prompt replaced by the README section
    pub const README_PLACEHOLDER: &str = "{readme_section}";

    pub const DEFAULT_README: &str = "README.md";

    pub const FILE_EXTENSION: &str = "md";
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Health check timeout (seconds)
    pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
}
