//! AI adapters - Implementations of the AIProvider port.
//!
//! - `GeminiProvider` - Google Generative Language API
//! - `MockAIProvider` - Scripted responses for tests and local runs

mod gemini_provider;
mod mock_provider;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
