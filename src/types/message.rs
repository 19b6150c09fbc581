//! Conversation primitives shared by the providers and the chat pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Speaker of a single conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of an LLM conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered user/assistant exchange log for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<ChatMessage>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// The last `n` entries, or all of them when fewer exist
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Content of the most recent assistant entry
    pub fn last_assistant(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Append a user entry followed by the assistant's reply
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.entries.push(ChatMessage::user(user));
        self.entries.push(ChatMessage::assistant(assistant));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<ChatMessage>> for History {
    fn from(entries: Vec<ChatMessage>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .filter(|m| m.role != Role::System)
                .collect(),
        }
    }
}

/// Route chosen by the intent classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    #[default]
    General,
    DesignSpecs,
}

impl Intent {
    /// Prompt key and display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::DesignSpecs => "DESIGN_SPECS",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GENERAL" => Ok(Self::General),
            "DESIGN_SPECS" => Ok(Self::DesignSpecs),
            other => Err(format!("unknown intent: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_window() {
        let mut history = History::new();
        history.record_exchange("q1", "a1");
        history.record_exchange("q2", "a2");
        history.record_exchange("q3", "a3");

        let recent = history.recent(4);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].content, "q2");
        assert_eq!(recent[3].content, "a3");

        assert_eq!(history.recent(100).len(), 6);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn test_last_assistant() {
        let mut history = History::new();
        assert_eq!(history.last_assistant(), None);

        history.record_exchange("hello", "hi there");
        history.record_exchange("design a cache", "Here is a cache design");
        assert_eq!(history.last_assistant(), Some("Here is a cache design"));
    }

    #[test]
    fn test_history_drops_system_entries() {
        let history = History::from(vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].role, Role::User);
    }

    #[test]
    fn test_intent_names() {
        assert_eq!(Intent::General.to_string(), "GENERAL");
        assert_eq!(Intent::DesignSpecs.to_string(), "DESIGN_SPECS");
        assert_eq!("design_specs".parse::<Intent>(), Ok(Intent::DesignSpecs));
        assert!("other".parse::<Intent>().is_err());
        assert_eq!(
            serde_json::to_string(&Intent::DesignSpecs).unwrap(),
            "\"DESIGN_SPECS\""
        );
    }

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }
}
