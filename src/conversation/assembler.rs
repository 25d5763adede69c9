//! Prompt assembly: system instruction, prior turns, new user turn

use super::transcript::Turn;
use crate::llm::LlmMessage;
use std::fmt;

/// Which prior turns are resent with each request. Eviction is always
/// oldest-first; the system instruction and the new user turn are never
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPolicy {
    /// Resend the whole transcript
    Unbounded,
    /// Keep the newest `n` prior turns
    LastTurns(usize),
    /// Keep the newest prior turns whose estimated tokens, together with the
    /// system instruction and the new user turn, fit the budget
    TokenBudget(usize),
}

impl Default for ContextPolicy {
    fn default() -> Self {
        ContextPolicy::LastTurns(50)
    }
}

impl fmt::Display for ContextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextPolicy::Unbounded => write!(f, "unbounded"),
            ContextPolicy::LastTurns(n) => write!(f, "last {n} turns"),
            ContextPolicy::TokenBudget(t) => write!(f, "{t} token budget"),
        }
    }
}

/// Rough token estimate: four characters per token, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler {
    policy: ContextPolicy,
}

impl PromptAssembler {
    pub fn new(policy: ContextPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ContextPolicy {
        self.policy
    }

    /// Build the ordered message list for one request.
    ///
    /// `prior` is the transcript before the new user turn is appended.
    pub fn build(
        &self,
        prior: &[Turn],
        system_instruction: &str,
        new_user_text: &str,
    ) -> Vec<LlmMessage> {
        let kept = self.window(prior, system_instruction, new_user_text);

        let mut messages = Vec::with_capacity(kept.len() + 2);
        messages.push(LlmMessage::system(system_instruction));
        messages.extend(kept.iter().map(Turn::to_message));
        messages.push(LlmMessage::user(new_user_text));
        messages
    }

    /// The suffix of `prior` that the policy lets through
    fn window<'a>(&self, prior: &'a [Turn], system: &str, new_user: &str) -> &'a [Turn] {
        let start = match self.policy {
            ContextPolicy::Unbounded => 0,
            ContextPolicy::LastTurns(n) => prior.len().saturating_sub(n),
            ContextPolicy::TokenBudget(budget) => {
                let mut remaining =
                    budget.saturating_sub(estimate_tokens(system) + estimate_tokens(new_user));
                let mut start = prior.len();
                for turn in prior.iter().rev() {
                    let cost = estimate_tokens(turn.content());
                    if cost > remaining {
                        break;
                    }
                    remaining -= cost;
                    start -= 1;
                }
                start
            }
        };
        &prior[start..]
    }
}
