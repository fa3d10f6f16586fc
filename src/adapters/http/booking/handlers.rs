//! HTTP handlers for booking session endpoints.
//!
//! Each handler resolves the session, locks it for the duration of the
//! request and delegates to the application layer.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::conversation::ConversationEngine;
use crate::application::session::{SessionHandle, SessionRegistry};
use crate::domain::foundation::{ErrorCode, SessionId, ValidationError};

use super::dto::{
    ErrorResponse, SendMessageRequest, SessionStartedResponse, SessionView, TurnResponse,
};

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4_000;

/// Shared application state for booking handlers.
#[derive(Clone)]
pub struct BookingAppState {
    pub engine: ConversationEngine,
    pub sessions: SessionRegistry,
}

impl BookingAppState {
    pub fn new(engine: ConversationEngine, sessions: SessionRegistry) -> Self {
        Self { engine, sessions }
    }

    async fn session(&self, raw_id: &str) -> Result<SessionHandle, BookingApiError> {
        let id: SessionId = raw_id
            .parse()
            .map_err(|_| BookingApiError::BadRequest("Invalid session ID format".to_string()))?;

        self.sessions
            .get(&id)
            .await
            .ok_or_else(|| BookingApiError::NotFound("Session".to_string(), raw_id.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/sessions
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Start a booking conversation.
pub async fn create_session(State(state): State<BookingAppState>) -> impl IntoResponse {
    let (_, handle) = state.sessions.create().await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionStartedResponse::from(&*session)))
}

// ════════════════════════════════════════════════════════════════════════════════
// GET /api/sessions/:id
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/sessions/:id - Current stage and transcript.
///
/// # Errors
/// - 400 Bad Request: Malformed session ID
/// - 404 Not Found: Session not found
pub async fn get_session(
    State(state): State<BookingAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, BookingApiError> {
    let handle = state.session(&session_id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

// ════════════════════════════════════════════════════════════════════════════════
// DELETE /api/sessions/:id
// ════════════════════════════════════════════════════════════════════════════════

/// DELETE /api/sessions/:id - End a session and discard it.
///
/// # Errors
/// - 400 Bad Request: Malformed session ID
/// - 404 Not Found: Session not found
pub async fn delete_session(
    State(state): State<BookingAppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, BookingApiError> {
    let id: SessionId = session_id
        .parse()
        .map_err(|_| BookingApiError::BadRequest("Invalid session ID format".to_string()))?;

    if state.sessions.remove(&id).await {
        tracing::info!(session_id = %id, "Session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(BookingApiError::NotFound("Session".to_string(), session_id))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/sessions/:id/messages
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions/:id/messages - Run one conversation turn.
///
/// Turns on the same session are serialized by the session lock.
///
/// # Errors
/// - 400 Bad Request: Malformed session ID or oversized message
/// - 4xx: Missing or malformed JSON body (status chosen by the extractor)
/// - 404 Not Found: Session not found
pub async fn send_message(
    State(state): State<BookingAppState>,
    Path(session_id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BookingApiError> {
    let Json(request) = body?;
    let length = request.message.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(BookingApiError::Validation(ValidationError::invalid_format(
            "message",
            format!("{} characters exceeds the limit of {}", length, MAX_MESSAGE_CHARS),
        )));
    }

    let handle = state.session(&session_id).await?;
    let mut session = handle.lock().await;

    let outcome = session.handle_message(&state.engine, &request.message).await;
    if let Some(booking) = &outcome.booking {
        tracing::info!(session_id = %session.id(), booked_at = %booking.timestamp_string(), "Booking confirmed");
    }

    Ok(Json(TurnResponse {
        reply: outcome.reply,
        stage: outcome.state.stage,
        turn: session.transcript().len(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/sessions/:id/reset
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions/:id/reset - Clear state and transcript.
///
/// # Errors
/// - 400 Bad Request: Malformed session ID
/// - 404 Not Found: Session not found
pub async fn reset_session(
    State(state): State<BookingAppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, BookingApiError> {
    let handle = state.session(&session_id).await?;
    let mut session = handle.lock().await;
    session.reset();
    Ok(Json(SessionStartedResponse::from(&*session)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts failures to HTTP responses.
#[derive(Debug)]
pub enum BookingApiError {
    BadRequest(String),
    MalformedBody(JsonRejection),
    Validation(ValidationError),
    NotFound(String, String),
}

impl From<JsonRejection> for BookingApiError {
    fn from(rejection: JsonRejection) -> Self {
        BookingApiError::MalformedBody(rejection)
    }
}

impl IntoResponse for BookingApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            BookingApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::InvalidFormat, msg),
            ),
            BookingApiError::MalformedBody(rejection) => (
                rejection.status(),
                ErrorResponse::new(ErrorCode::InvalidFormat, rejection.body_text()),
            ),
            BookingApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationFailed, err.to_string()),
            ),
            BookingApiError::NotFound(resource, id) => {
                (StatusCode::NOT_FOUND, ErrorResponse::not_found(&resource, &id))
            }
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_maps_to_400() {
        let response = BookingApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response =
            BookingApiError::NotFound("Session".to_string(), "x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_body_keeps_extractor_status_with_json_error() {
        use axum::body::{to_bytes, Body};
        use axum::extract::FromRequest;
        use axum::http::Request;

        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let rejection = Json::<SendMessageRequest>::from_request(request, &())
            .await
            .unwrap_err();

        let response = BookingApiError::from(rejection).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_FORMAT");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn validation_maps_to_400() {
        let err = ValidationError::invalid_format("message", "too long");
        let response = BookingApiError::Validation(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
