//! Conversation - the booking dialogue engine and its collaborators.

mod engine;
mod generation;
pub mod prompts;

pub use engine::{
    is_restart_request, ConversationEngine, EngineConfig, TurnOutcome, CLARIFICATION_SUFFIX,
    GREETING, RESTART_MESSAGE,
};
pub use generation::GenerationClient;
pub use prompts::Instruction;
