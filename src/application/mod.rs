//! Application layer - use cases built on the domain and ports.
//!
//! - `conversation` - the per-turn booking engine and generation client
//! - `session` - per-client state, transcript and the session registry

pub mod conversation;
pub mod session;

pub use conversation::{ConversationEngine, EngineConfig, GenerationClient, TurnOutcome};
pub use session::{Exchange, Session, SessionHandle, SessionRegistry};
