//! Minimal message types for conversation history and LLM prompts.
//!
//! Message roles: System (usually first in the list), User, Assistant.
//! Used by `Session::history` and by `LlmClient::invoke`.

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt; typically placed first in the message list.
    System(String),
    /// User input.
    User(String),
    /// Bot reply (text replies only; dataset lists are recorded as a short summary).
    Assistant(String),
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Text content regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(s) | Message::User(s) | Message::Assistant(s) => s,
        }
    }
}
