//! Gemini Provider - Implementation of AIProvider for Google's Generative Language API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = GeminiConfig::new(api_key)
//!     .with_model("gemini-1.5-flash")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let provider = GeminiProvider::new(config)?;
//! ```
//!
//! Requests go to `{base_url}/models/{model}:generateContent` with the key
//! in the `x-goog-api-key` header. Transient failures are retried with
//! exponential backoff; everything else is returned to the caller.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, MessageRole,
    ProviderInfo,
};

/// Longest wait between two attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
const MAX_BACKOFF_DOUBLINGS: u32 = 10;

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gemini-1.5-flash").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl GeminiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Gemini API provider implementation.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a new Gemini provider with the given configuration.
    ///
    /// # Errors
    /// Returns `AIError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Converts our request to Gemini's format.
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(msg.content.clone()),
                }],
            })
            .collect();

        let system_instruction = request.system_prompt.as_ref().map(|prompt| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(prompt.clone()),
            }],
        });

        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        self.client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key())
            .json(&Self::to_gemini_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::error_for_status(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::interpret_response(gemini_response, &self.config.model)
    }

    /// Maps a non-success status and body to an `AIError`.
    fn error_for_status(status: u16, body: &str) -> AIError {
        match status {
            401 | 403 => AIError::AuthenticationFailed,
            400 if body.contains("API_KEY_INVALID") => AIError::AuthenticationFailed,
            400 => AIError::InvalidRequest(body.to_string()),
            429 => AIError::rate_limited(Self::parse_retry_delay(body)),
            500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
            _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
        }
    }

    /// Reads `retryDelay` (e.g. `"17s"`) from a rate-limit body; 30s otherwise.
    fn parse_retry_delay(body: &str) -> u32 {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|parsed| {
                parsed["error"]["details"].as_array().and_then(|details| {
                    details.iter().find_map(|detail| {
                        detail["retryDelay"]
                            .as_str()
                            .and_then(|delay| delay.trim_end_matches('s').parse::<f64>().ok())
                            .map(|secs| secs.ceil() as u32)
                    })
                })
            })
            .unwrap_or(30)
    }

    /// Delay before retry number `retry_count + 1`: exponential backoff,
    /// at least the server's `retryDelay` on 429, never above `MAX_RETRY_DELAY`.
    fn retry_delay(&self, err: &AIError, retry_count: u32) -> Duration {
        let backoff = self
            .config
            .retry_backoff
            .saturating_mul(1u32 << retry_count.min(MAX_BACKOFF_DOUBLINGS));
        let delay = match err {
            AIError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(u64::from(*retry_after_secs)))
            }
            _ => backoff,
        };
        delay.min(MAX_RETRY_DELAY)
    }

    /// Turns a decoded body into a completion, surfacing prompt blocks.
    fn interpret_response(response: GeminiResponse, model: &str) -> Result<CompletionResponse, AIError> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Err(AIError::content_filtered(reason));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No candidates in response"))?;

        let content = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST")
            | Some("PROHIBITED_CONTENT") | Some("SPII") => FinishReason::ContentFilter,
            Some(_) => FinishReason::Error,
        };

        Ok(CompletionResponse {
            content,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let result = match self.send_request(&request).await {
                Ok(response) => self.parse_response(response).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(completion) => return Ok(completion),
                Err(err) if !err.is_retryable() || retry_count >= self.config.max_retries => {
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.retry_delay(&err, retry_count);
                    tracing::debug!(error = %err, attempt = retry_count + 1, ?delay, "Retrying Gemini request");
                    sleep(delay).await;
                    retry_count += 1;
                }
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        let max_context = match self.config.model.as_str() {
            m if m.starts_with("gemini-1.5-pro") => 2_097_152,
            m if m.starts_with("gemini-1.0") => 32_768,
            _ => 1_048_576,
        };

        ProviderInfo::new("gemini", &self.config.model, max_context)
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn parse(body: serde_json::Value) -> Result<CompletionResponse, AIError> {
        let response: GeminiResponse = serde_json::from_value(body).unwrap();
        GeminiProvider::interpret_response(response, "gemini-1.5-flash")
    }

    /// Serves canned `(status, body)` replies in order, counting requests.
    async fn serve(replies: Vec<(StatusCode, serde_json::Value)>) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let replies = Arc::new(replies);

        let app = Router::new().route(
            "/models/:call",
            post(move || {
                let counter = counter.clone();
                let replies = replies.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = replies[n.min(replies.len() - 1)].clone();
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), hits)
    }

    fn provider_for(base_url: &str) -> GeminiProvider {
        let config = GeminiConfig::new("test-key")
            .with_base_url(base_url)
            .with_max_retries(2)
            .with_retry_backoff(Duration::from_millis(1));
        GeminiProvider::new(config).unwrap()
    }

    #[test]
    fn retry_delay_doubles_and_is_bounded() {
        let provider = GeminiProvider::new(
            GeminiConfig::new("test-key").with_retry_backoff(Duration::from_secs(1)),
        )
        .unwrap();
        let unavailable = AIError::unavailable("busy");

        assert_eq!(provider.retry_delay(&unavailable, 0), Duration::from_secs(1));
        assert_eq!(provider.retry_delay(&unavailable, 2), Duration::from_secs(4));
        assert_eq!(provider.retry_delay(&unavailable, 63), MAX_RETRY_DELAY);
    }

    #[test]
    fn retry_delay_honours_rate_limit_hint() {
        let provider = GeminiProvider::new(
            GeminiConfig::new("test-key").with_retry_backoff(Duration::from_millis(1)),
        )
        .unwrap();

        assert_eq!(
            provider.retry_delay(&AIError::rate_limited(17), 0),
            Duration::from_secs(17)
        );
        assert_eq!(
            provider.retry_delay(&AIError::rate_limited(3_600), 0),
            MAX_RETRY_DELAY
        );
    }

    fn ok_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "modelVersion": "gemini-1.5-flash-002"
        })
    }

    #[test]
    fn config_builder_works() {
        let config = GeminiConfig::new("test-key")
            .with_model("gemini-1.5-pro")
            .with_base_url("https://custom.example.com")
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(5);

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "https://custom.example.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_debug_does_not_leak_key() {
        let config = GeminiConfig::new("super-secret-key");
        assert!(!format!("{:?}", config).contains("super-secret-key"));
    }

    #[test]
    fn request_maps_roles_and_system_prompt() {
        let request = CompletionRequest::new()
            .with_message(MessageRole::User, "Hello")
            .with_message(MessageRole::Assistant, "Hi")
            .with_system_prompt("Reply in JSON")
            .with_temperature(0.2);

        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Reply in JSON");
        assert!(body["systemInstruction"].get("role").is_none());
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn request_without_tuning_omits_generation_config() {
        let request = CompletionRequest::new().with_message(MessageRole::User, "Hello");
        let body = serde_json::to_value(GeminiProvider::to_gemini_request(&request)).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn interprets_text_parts() {
        let response = parse(json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(response.content, "{\"a\": 1}");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.model, "gemini-1.5-flash");
    }

    #[test]
    fn safety_finish_maps_to_content_filter() {
        let response = parse(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();

        assert!(response.content.is_empty());
        assert_eq!(response.finish_reason, FinishReason::ContentFilter);
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let result = parse(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        assert!(matches!(result, Err(AIError::ContentFiltered { .. })));
    }

    #[test]
    fn no_candidates_is_a_parse_error() {
        let result = parse(json!({"candidates": []}));
        assert!(matches!(result, Err(AIError::Parse(_))));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            GeminiProvider::error_for_status(403, ""),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            GeminiProvider::error_for_status(400, r#"{"error":{"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#),
            AIError::AuthenticationFailed
        ));
        assert!(matches!(
            GeminiProvider::error_for_status(400, "bad"),
            AIError::InvalidRequest(_)
        ));
        assert!(matches!(
            GeminiProvider::error_for_status(503, "down"),
            AIError::Unavailable { .. }
        ));
    }

    #[test]
    fn parses_retry_delay() {
        let body = r#"{"error":{"code":429,"details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"17s"}]}}"#;
        assert_eq!(GeminiProvider::parse_retry_delay(body), 17);
        assert_eq!(GeminiProvider::parse_retry_delay("not json"), 30);
    }

    #[test]
    fn provider_info_reports_model() {
        let provider = GeminiProvider::new(GeminiConfig::new("k")).unwrap();
        let info = provider.provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, "gemini-1.5-flash");
        assert_eq!(info.max_context_tokens, 1_048_576);
    }

    #[tokio::test]
    async fn completes_against_http_endpoint() {
        let (base_url, hits) = serve(vec![(StatusCode::OK, ok_body("hello"))]).await;
        let provider = provider_for(&base_url);

        let response = provider
            .complete(CompletionRequest::new().with_message(MessageRole::User, "Hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "hello");
        assert_eq!(response.model, "gemini-1.5-flash-002");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let (base_url, hits) = serve(vec![
            (StatusCode::SERVICE_UNAVAILABLE, json!({"error": "overloaded"})),
            (StatusCode::OK, ok_body("recovered")),
        ])
        .await;
        let provider = provider_for(&base_url);

        let response = provider
            .complete(CompletionRequest::new().with_message(MessageRole::User, "Hi"))
            .await
            .unwrap();

        assert_eq!(response.content, "recovered");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let (base_url, hits) =
            serve(vec![(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "overloaded"}))]).await;
        let provider = provider_for(&base_url);

        let result = provider
            .complete(CompletionRequest::new().with_message(MessageRole::User, "Hi"))
            .await;

        assert!(matches!(result, Err(AIError::Unavailable { .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_auth_failures() {
        let (base_url, hits) =
            serve(vec![(StatusCode::UNAUTHORIZED, json!({"error": "bad key"}))]).await;
        let provider = provider_for(&base_url);

        let result = provider
            .complete(CompletionRequest::new().with_message(MessageRole::User, "Hi"))
            .await;

        assert!(matches!(result, Err(AIError::AuthenticationFailed)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
