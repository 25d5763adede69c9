//! Session state and per-session context

use crate::conversation::{PromptAssembler, Transcript};
use std::sync::Arc;

/// Turn-taking state of a session. Every variant is "active": a session
/// never terminates on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Accepting user input
    #[default]
    Idle,
    /// One gateway call in flight
    AwaitingReply { request_id: u64 },
    /// Reset while a call was in flight. Its outcome is discarded and input
    /// stays blocked until it arrives.
    Draining { request_id: u64 },
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingReply { .. } => "awaiting_reply",
            SessionState::Draining { .. } => "draining",
        }
    }

    /// The id of the gateway call still outstanding, if any
    pub fn pending_request(self) -> Option<u64> {
        match self {
            SessionState::Idle => None,
            SessionState::AwaitingReply { request_id } | SessionState::Draining { request_id } => {
                Some(request_id)
            }
        }
    }

    /// True while a gateway call is outstanding; user input is refused
    pub fn is_awaiting_reply(self) -> bool {
        self.pending_request().is_some()
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// Everything one session owns. Never shared between sessions; only the
/// system instruction text is a shared immutable reference.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub system_instruction: Arc<str>,
    pub assembler: PromptAssembler,
    pub settings: GenerationSettings,
    pub transcript: Transcript,
}

impl SessionContext {
    pub fn new(
        session_id: impl Into<String>,
        system_instruction: Arc<str>,
        assembler: PromptAssembler,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            system_instruction,
            assembler,
            settings,
            transcript: Transcript::new(),
        }
    }
}
