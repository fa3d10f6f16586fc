//! HTTP DTOs for booking session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::session::{Exchange, Session};
use crate::domain::booking::BookingStage;
use crate::domain::foundation::ErrorCode;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of a user turn.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Returned when a session starts or is reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedResponse {
    pub session_id: String,
    pub greeting: String,
    pub stage: BookingStage,
}

impl From<&Session> for SessionStartedResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            greeting: session.greeting().to_string(),
            stage: session.stage(),
        }
    }
}

/// Full view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub stage: BookingStage,
    pub transcript: Vec<ExchangeView>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            stage: session.stage(),
            transcript: session.transcript().iter().map(ExchangeView::from).collect(),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeView {
    pub user: String,
    pub bot: String,
}

impl From<&Exchange> for ExchangeView {
    fn from(exchange: &Exchange) -> Self {
        Self {
            user: exchange.user.clone(),
            bot: exchange.bot.clone(),
        }
    }
}

/// Reply to a user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub reply: String,
    pub stage: BookingStage,
    /// 1-based index of this turn in the transcript.
    pub turn: usize,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource_type: &str, id: &str) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("{} not found: {}", resource_type, id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn started_response_uses_camel_case() {
        let session = Session::new();
        let value = serde_json::to_value(SessionStartedResponse::from(&session)).unwrap();

        assert_eq!(value["sessionId"], session.id().to_string());
        assert_eq!(value["stage"], "ASK_NAME");
        assert!(value["greeting"].as_str().unwrap().starts_with("Hello!"));
    }

    #[test]
    fn turn_response_shape() {
        let response = TurnResponse {
            reply: "How old are you?".to_string(),
            stage: BookingStage::AskAge,
            turn: 1,
        };

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({"reply": "How old are you?", "stage": "ASK_AGE", "turn": 1})
        );
    }

    #[test]
    fn error_response_carries_code() {
        let error = ErrorResponse::not_found("Session", "abc");
        assert_eq!(error.code, "SESSION_NOT_FOUND");
        assert_eq!(error.message, "Session not found: abc");
    }
}
