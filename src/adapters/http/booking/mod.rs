//! HTTP adapter for booking session endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ErrorResponse, ExchangeView, SendMessageRequest, SessionStartedResponse, SessionView,
    TurnResponse,
};
pub use handlers::{BookingApiError, BookingAppState, MAX_MESSAGE_CHARS};
pub use routes::{booking_router, booking_routes, cors_layer};
