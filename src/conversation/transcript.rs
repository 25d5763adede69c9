//! Transcript store: the ordered turns of one session

use super::persona::{RESET_GREETING, WELCOME_GREETING};
use crate::llm::{LlmMessage, MessageRole};
use serde::Serialize;

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: MessageRole,
    content: String,
}

impl Turn {
    /// Returns `None` for blank content
    pub fn new(role: MessageRole, content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }
        Some(Self { role, content })
    }

    pub fn user(content: impl Into<String>) -> Option<Self> {
        Self::new(MessageRole::User, content)
    }

    /// Canned assistant text (greetings, apology); never blank
    pub(crate) fn fixed(content: &'static str) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.to_string(),
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn to_message(&self) -> LlmMessage {
        LlmMessage::new(self.role, self.content.clone())
    }
}

/// Append-only history of a single session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// A fresh transcript holding the welcome greeting
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::fixed(WELCOME_GREETING)],
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Replace the history with the single reset greeting
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::fixed(RESET_GREETING));
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
