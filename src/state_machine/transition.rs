//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. Transcript mutation and gateway I/O happen only when the runtime
//! executes the returned effects.

use super::{Effect, Event, SessionContext, SessionState};
use crate::conversation::persona::APOLOGY;
use crate::conversation::Turn;
use crate::llm::{LlmRequest, MessageRole};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition. Both leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Still waiting for the previous reply, please wait a moment")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
}

pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (*state, event) {
        // ============================================================
        // User Message Handling
        // ============================================================

        (SessionState::Idle, Event::UserMessage { text, request_id }) => {
            let turn = Turn::user(text).ok_or(TransitionError::EmptyMessage)?;

            // Assembled from the transcript as it was before this turn
            let messages = context.assembler.build(
                context.transcript.all(),
                &context.system_instruction,
                turn.content(),
            );
            let request = LlmRequest {
                messages,
                temperature: context.settings.temperature,
                max_tokens: context.settings.max_tokens,
            };

            let awaiting = SessionState::AwaitingReply { request_id };
            Ok(TransitionResult::new(awaiting)
                .with_effect(Effect::AppendTurn(turn))
                .with_effect(Effect::NotifyStateChange(awaiting))
                .with_effect(Effect::RequestCompletion {
                    request_id,
                    request,
                }))
        }

        (
            SessionState::AwaitingReply { .. } | SessionState::Draining { .. },
            Event::UserMessage { .. },
        ) => Err(TransitionError::Busy),

        // ============================================================
        // Gateway Outcomes
        // ============================================================

        (
            SessionState::AwaitingReply { request_id },
            Event::GatewayReply {
                request_id: reply_id,
                text,
            },
        ) if request_id == reply_id => {
            let turn = Turn::new(MessageRole::Assistant, text)
                .unwrap_or_else(|| Turn::fixed(APOLOGY));
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::AppendTurn(turn))
                .with_effect(Effect::NotifyStateChange(SessionState::Idle)))
        }

        (
            SessionState::AwaitingReply { request_id },
            Event::GatewayFailed {
                request_id: failed_id,
                message,
            },
        ) if request_id == failed_id => Ok(TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::AppendTurn(Turn::fixed(APOLOGY)))
            .with_effect(Effect::notify_error(format!("An error occurred: {message}")))
            .with_effect(Effect::NotifyStateChange(SessionState::Idle))),

        // The call a reset superseded has finished; its outcome is dropped
        (
            SessionState::Draining { request_id },
            Event::GatewayReply {
                request_id: reply_id,
                ..
            }
            | Event::GatewayFailed {
                request_id: reply_id,
                ..
            },
        ) if request_id == reply_id => Ok(TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::NotifyStateChange(SessionState::Idle))),

        // Unknown request ids change nothing
        (state, Event::GatewayReply { .. } | Event::GatewayFailed { .. }) => {
            Ok(TransitionResult::new(state))
        }

        // ============================================================
        // Reset
        // ============================================================

        // An in-flight call keeps running, so input stays blocked until it
        // reports back
        (SessionState::AwaitingReply { request_id }, Event::Reset) => {
            let draining = SessionState::Draining { request_id };
            Ok(TransitionResult::new(draining)
                .with_effect(Effect::ResetTranscript)
                .with_effect(Effect::NotifyStateChange(draining)))
        }

        (state @ (SessionState::Idle | SessionState::Draining { .. }), Event::Reset) => {
            Ok(TransitionResult::new(state).with_effect(Effect::ResetTranscript))
        }
    }
}
