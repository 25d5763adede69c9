//! Conversation core: transcript store, prompt assembly, persona text

mod assembler;
pub mod persona;
mod transcript;

#[cfg(test)]
mod proptests;

pub use assembler::{ContextPolicy, PromptAssembler};
pub use transcript::{Transcript, Turn};
