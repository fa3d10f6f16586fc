//! GenerationClient - Wraps an instruction in the decision contract and
//! asks the text provider for a reply.
//!
//! Every failure (transport error, blocked content, empty body) collapses
//! to `None`. Nothing here retries; the provider adapter owns retries.

use std::sync::Arc;

use crate::domain::booking::BookingStage;
use crate::ports::{AIProvider, CompletionRequest, FinishReason, MessageRole};

/// Stateless client for one-shot decision requests.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn AIProvider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sets the sampling temperature sent with each request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Caps the length of each reply.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Appends the structured-reply contract and the legal actions.
    pub fn wrap_instruction(instruction: &str) -> String {
        let actions = BookingStage::ALL
            .iter()
            .map(|stage| format!("'{}'", stage.as_str()))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{instruction}\n\n\
             Respond STRICTLY in the following JSON format. Do not include any text outside the JSON structure.\n\
             ```json\n\
             {{\n  \"next_action\": \"ACTION_ENUM\",\n  \"bot_message\": \"Your response message here.\",\n  \"extracted_data\": {{ ... }}\n}}\n\
             ```\n\
             Ensure 'next_action' is one of: [{actions}]"
        )
    }

    /// Sends one instruction; returns the raw reply text or `None`.
    pub async fn generate(&self, instruction: &str) -> Option<String> {
        let prompt = Self::wrap_instruction(instruction);
        tracing::debug!(prompt = %prompt, "Sending prompt");

        let mut request = CompletionRequest::new().with_message(MessageRole::User, prompt);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Generation request failed");
                return None;
            }
        };

        tracing::debug!(model = %response.model, raw = %response.content, "Raw response");

        if response.finish_reason == FinishReason::ContentFilter {
            tracing::warn!("Generation response was blocked");
            return None;
        }
        if response.content.trim().is_empty() {
            tracing::warn!("Generation response was empty");
            return None;
        }

        Some(response.content)
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("provider", &self.provider.provider_info().name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
