//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Text generation service
//! - `BookingSink` - Durable append-only booking store

mod ai_provider;
mod booking_sink;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo,
};
pub use booking_sink::{BookingSink, BookingSinkError};
