//! Property-based tests for the transcript and the prompt assembler

use super::assembler::estimate_tokens;
use super::persona::RESET_GREETING;
use super::*;
use crate::llm::MessageRole;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = MessageRole> {
    prop_oneof![Just(MessageRole::User), Just(MessageRole::Assistant)]
}

fn arb_turn() -> impl Strategy<Value = Turn> {
    (arb_role(), "[a-zA-Z0-9][a-zA-Z0-9 .,!?]{0,60}")
        .prop_map(|(role, text)| Turn::new(role, text).expect("generator yields non-blank text"))
}

fn arb_turns() -> impl Strategy<Value = Vec<Turn>> {
    prop::collection::vec(arb_turn(), 0..40)
}

fn arb_policy() -> impl Strategy<Value = ContextPolicy> {
    prop_oneof![
        Just(ContextPolicy::Unbounded),
        (0usize..20).prop_map(ContextPolicy::LastTurns),
        (0usize..400).prop_map(ContextPolicy::TokenBudget),
    ]
}

fn transcript_of(turns: &[Turn]) -> Transcript {
    let mut transcript = Transcript::new();
    for turn in turns {
        transcript.append(turn.clone());
    }
    transcript
}

// ============================================================================
// Transcript Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_append_preserves_insertion_order(turns in arb_turns()) {
        let transcript = transcript_of(&turns);
        prop_assert_eq!(transcript.len(), turns.len() + 1);
        prop_assert_eq!(&transcript.all()[1..], turns.as_slice());
    }

    #[test]
    fn prop_reset_always_single_greeting(turns in arb_turns(), resets in 1usize..4) {
        let mut transcript = transcript_of(&turns);
        for _ in 0..resets {
            transcript.reset();
            prop_assert_eq!(transcript.len(), 1);
            prop_assert_eq!(transcript.all()[0].role(), MessageRole::Assistant);
            prop_assert_eq!(transcript.all()[0].content(), RESET_GREETING);
        }
    }
}

// ============================================================================
// Assembler Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_build_frames_with_system_and_user(
        turns in arb_turns(),
        policy in arb_policy(),
        text in "[a-z]{1,30}",
    ) {
        let messages = PromptAssembler::new(policy).build(&turns, "INSTR", &text);

        prop_assert!(messages.len() >= 2);
        prop_assert_eq!(messages[0].role, MessageRole::System);
        prop_assert_eq!(messages.iter().filter(|m| m.role == MessageRole::System).count(), 1);
        let last = messages.last().unwrap();
        prop_assert_eq!(last.role, MessageRole::User);
        prop_assert_eq!(&last.content, &text);
    }

    #[test]
    fn prop_unbounded_resends_everything(turns in arb_turns(), text in "[a-z]{1,30}") {
        let messages = PromptAssembler::new(ContextPolicy::Unbounded).build(&turns, "INSTR", &text);

        prop_assert_eq!(messages.len(), turns.len() + 2);
        for (message, turn) in messages[1..messages.len() - 1].iter().zip(&turns) {
            prop_assert_eq!(message.role, turn.role());
            prop_assert_eq!(message.content.as_str(), turn.content());
        }
    }

    #[test]
    fn prop_window_is_newest_suffix(
        turns in arb_turns(),
        policy in arb_policy(),
        text in "[a-z]{1,30}",
    ) {
        let messages = PromptAssembler::new(policy).build(&turns, "INSTR", &text);
        let kept = &messages[1..messages.len() - 1];
        prop_assert!(kept.len() <= turns.len());

        let suffix = &turns[turns.len() - kept.len()..];
        for (message, turn) in kept.iter().zip(suffix) {
            prop_assert_eq!(message.content.as_str(), turn.content());
        }

        if let ContextPolicy::LastTurns(n) = policy {
            prop_assert_eq!(kept.len(), n.min(turns.len()));
        }
        if let ContextPolicy::TokenBudget(budget) = policy {
            let used: usize = messages.iter().map(|m| estimate_tokens(&m.content)).sum();
            prop_assert!(kept.is_empty() || used <= budget);
        }
    }
}
