//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Text generation providers (Gemini, mock)
//! - `storage` - Booking sinks (CSV file, in-memory)
//! - `http` - REST surface for chat sessions

pub mod ai;
pub mod http;
pub mod storage;

pub use ai::{GeminiConfig, GeminiProvider, MockAIProvider};
pub use storage::{CsvBookingSink, InMemoryBookingSink};
