//! Effects produced by state transitions

use super::SessionState;
use crate::conversation::Turn;
use crate::llm::LlmRequest;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Append a turn to the transcript and push it to clients
    AppendTurn(Turn),

    /// Replace the transcript with the reset greeting and push it to clients
    ResetTranscript,

    /// Call the inference gateway (spawns as background task)
    RequestCompletion {
        request_id: u64,
        request: LlmRequest,
    },

    /// Notify connected clients of a state change
    NotifyStateChange(SessionState),

    /// Notify connected clients that the last exchange failed
    NotifyError { message: String },
}

impl Effect {
    pub fn notify_error(message: impl Into<String>) -> Self {
        Effect::NotifyError {
            message: message.into(),
        }
    }
}
