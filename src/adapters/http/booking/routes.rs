//! Axum routes for booking session endpoints.

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_session, delete_session, get_session, reset_session, send_message, BookingAppState,
};

/// Creates routes for booking session endpoints.
///
/// REST Endpoints:
/// - POST /sessions - Start a conversation
/// - GET /sessions/:id - Stage and transcript
/// - DELETE /sessions/:id - Discard the session
/// - POST /sessions/:id/messages - Send one user message
/// - POST /sessions/:id/reset - Clear the conversation
pub fn booking_routes() -> Router<BookingAppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/messages", post(send_message))
        .route("/sessions/:id/reset", post(reset_session))
}

/// Complete router with all booking routes under /api, request tracing
/// and state attached.
pub fn booking_router(state: BookingAppState) -> Router {
    Router::new()
        .nest("/api", booking_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer for the given origins; `None` when no origin is usable.
pub fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
    )
}
