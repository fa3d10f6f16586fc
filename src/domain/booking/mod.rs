//! Booking domain module.
//!
//! Stages, running state, validators and the decision contract for the
//! name → age → email booking dialogue.

mod decision;
mod extractor;
mod record;
mod stage;
mod state;
mod validators;

pub use decision::{ConversationDecision, ExtractedFields, NextAction};
pub use extractor::{
    DecisionExtractor, ExtractionError, ResponseSanitizer, SanitizationError,
    MAX_RESPONSE_LENGTH,
};
pub use record::{BookingRecord, BOOKING_COLUMNS, BOOKING_TIMESTAMP_FORMAT};
pub use stage::BookingStage;
pub use state::{BookingDetails, ConversationState, ErrorBudget};
pub use validators::{is_nontrivial_name, validate_age, validate_email, InvalidAge};
