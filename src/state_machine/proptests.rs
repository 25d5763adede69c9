//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use crate::conversation::persona::{APOLOGY, RESET_GREETING};
use crate::conversation::{ContextPolicy, PromptAssembler};
use crate::llm::MessageRole;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(
        "test-session",
        Arc::from("INSTR"),
        PromptAssembler::new(ContextPolicy::Unbounded),
        GenerationSettings::default(),
    )
}

/// What the runtime would do with transcript-touching effects
fn apply(context: &mut SessionContext, effects: &[Effect]) -> Option<u64> {
    let mut requested = None;
    for effect in effects {
        match effect {
            Effect::AppendTurn(turn) => context.transcript.append(turn.clone()),
            Effect::ResetTranscript => context.transcript.reset(),
            Effect::RequestCompletion { request_id, .. } => requested = Some(*request_id),
            Effect::NotifyStateChange(_) | Effect::NotifyError { .. } => {}
        }
    }
    requested
}

#[derive(Debug, Clone)]
enum Action {
    Send(String),
    Reply(String),
    Fail,
    StaleReply,
    Reset,
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => "[a-z][a-z ]{0,20}".prop_map(Action::Send),
        2 => "[a-z][a-z ]{0,20}".prop_map(Action::Reply),
        1 => Just(Action::Fail),
        1 => Just(Action::StaleReply),
        1 => Just(Action::Reset),
    ]
}

fn event_for(action: &Action, state: SessionState, next_id: u64) -> Event {
    let pending = state.pending_request().unwrap_or(0);
    match action {
        Action::Send(text) => Event::UserMessage {
            text: text.clone(),
            request_id: next_id,
        },
        Action::Reply(text) => Event::GatewayReply {
            request_id: pending,
            text: text.clone(),
        },
        Action::Fail => Event::GatewayFailed {
            request_id: pending,
            message: "boom".to_string(),
        },
        Action::StaleReply => Event::GatewayReply {
            request_id: u64::MAX,
            text: "stale".to_string(),
        },
        Action::Reset => Event::Reset,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_transcript_never_empty_and_requests_well_formed(
        actions in prop::collection::vec(arb_action(), 1..60)
    ) {
        let mut context = test_context();
        let mut state = SessionState::Idle;
        let mut next_id = 1;

        for action in &actions {
            let before = context.transcript.clone();
            let event = event_for(action, state, next_id);

            match transition(&state, &context, event) {
                Ok(result) => {
                    for effect in &result.effects {
                        if let Effect::RequestCompletion { request, .. } = effect {
                            prop_assert_eq!(request.messages.len(), before.len() + 2);
                            prop_assert_eq!(request.messages[0].role, MessageRole::System);
                            let last = request.messages.last().unwrap();
                            prop_assert_eq!(last.role, MessageRole::User);
                        }
                    }
                    if apply(&mut context, &result.effects).is_some() {
                        next_id += 1;
                    }
                    state = result.new_state;
                }
                Err(TransitionError::Busy) => {
                    prop_assert!(state.is_awaiting_reply());
                    prop_assert_eq!(&context.transcript, &before);
                }
                Err(TransitionError::EmptyMessage) => {
                    prop_assert!(false, "generator never yields blank text");
                }
            }

            prop_assert!(!context.transcript.is_empty());
        }
    }

    #[test]
    fn prop_failed_exchange_adds_user_and_apology(
        history in prop::collection::vec("[a-z]{1,10}", 0..10),
        text in "[a-z]{1,20}",
    ) {
        let mut context = test_context();
        let mut state = SessionState::Idle;
        let mut request_id = 0;

        // Build some successful history first
        for line in &history {
            request_id += 1;
            let event = Event::UserMessage { text: line.clone(), request_id };
            let sent = transition(&state, &context, event).unwrap();
            apply(&mut context, &sent.effects);
            let replied = transition(&sent.new_state, &context, Event::GatewayReply {
                request_id,
                text: format!("re: {line}"),
            }).unwrap();
            apply(&mut context, &replied.effects);
            state = replied.new_state;
        }

        let before = context.transcript.len();
        request_id += 1;
        let event = Event::UserMessage { text: text.clone(), request_id };
        let sent = transition(&state, &context, event).unwrap();
        apply(&mut context, &sent.effects);
        let failed = transition(&sent.new_state, &context, Event::GatewayFailed {
            request_id,
            message: "timeout".to_string(),
        }).unwrap();
        apply(&mut context, &failed.effects);

        prop_assert_eq!(failed.new_state, SessionState::Idle);
        prop_assert_eq!(context.transcript.len(), before + 2);
        let turns = context.transcript.all();
        prop_assert_eq!(turns[before].role(), MessageRole::User);
        prop_assert_eq!(turns[before].content(), text.as_str());
        prop_assert_eq!(turns[before + 1].role(), MessageRole::Assistant);
        prop_assert_eq!(turns[before + 1].content(), APOLOGY);
    }

    #[test]
    fn prop_reset_from_any_state_is_single_greeting(
        actions in prop::collection::vec(arb_action(), 0..30)
    ) {
        let mut context = test_context();
        let mut state = SessionState::Idle;
        let mut next_id = 1;
        for action in &actions {
            if let Ok(result) = transition(&state, &context, event_for(action, state, next_id)) {
                if apply(&mut context, &result.effects).is_some() {
                    next_id += 1;
                }
                state = result.new_state;
            }
        }

        let pending = state.pending_request();
        for _ in 0..2 {
            let result = transition(&state, &context, Event::Reset).unwrap();
            apply(&mut context, &result.effects);
            state = result.new_state;
            // An outstanding call is still tracked so its reply can be dropped
            prop_assert_eq!(state.pending_request(), pending);
            let awaiting_reply = matches!(state, SessionState::AwaitingReply { .. });
            prop_assert!(!awaiting_reply);
            prop_assert_eq!(context.transcript.len(), 1);
            prop_assert_eq!(context.transcript.all()[0].content(), RESET_GREETING);
        }
    }

    #[test]
    fn prop_at_most_one_call_outstanding(
        actions in prop::collection::vec(arb_action(), 1..80)
    ) {
        let mut context = test_context();
        let mut state = SessionState::Idle;
        let mut next_id = 1;
        let mut outstanding: Option<u64> = None;

        for action in &actions {
            let event = event_for(action, state, next_id);
            let finished = match &event {
                Event::GatewayReply { request_id, .. }
                | Event::GatewayFailed { request_id, .. } => Some(*request_id),
                _ => None,
            };
            if let Ok(result) = transition(&state, &context, event) {
                if finished.is_some() && finished == outstanding {
                    outstanding = None;
                }
                if let Some(request_id) = apply(&mut context, &result.effects) {
                    prop_assert!(outstanding.is_none(), "call {:?} still in flight", outstanding);
                    outstanding = Some(request_id);
                    next_id += 1;
                }
                state = result.new_state;
            }
            prop_assert_eq!(state.pending_request(), outstanding);
        }
    }
}
