//! Typed decision returned by the generation service each turn.
//!
//! The service output is untrusted. Everything here is built from an
//! already-parsed JSON value, and anything ill-typed is either dropped
//! (optional fields) or reported as a missing field (required ones).

use serde_json::Value;

use super::extractor::ExtractionError;
use super::stage::BookingStage;
use super::validators::{validate_age, validate_email};

/// The stage the service wants to move to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// One of the six legal stages.
    Stage(BookingStage),
    /// Anything else the service produced, kept verbatim for logging.
    Unrecognized(String),
}

impl NextAction {
    /// Classifies a raw `next_action` value.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<BookingStage>() {
            Ok(stage) => NextAction::Stage(stage),
            Err(_) => NextAction::Unrecognized(raw.to_string()),
        }
    }

    /// Returns the legal stage, if any.
    pub fn stage(&self) -> Option<BookingStage> {
        match self {
            NextAction::Stage(stage) => Some(*stage),
            NextAction::Unrecognized(_) => None,
        }
    }
}

/// Partial guest record carried in a decision's `extracted_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub email: Option<String>,
}

impl ExtractedFields {
    /// Reads the known fields out of an `extracted_data` object.
    ///
    /// A field that is present but unusable is dropped, never fatal.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let age = object.get("age").and_then(|age| match age {
            Value::Number(n) => n
                .as_u64()
                .filter(|v| *v > 0)
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => validate_age(s).ok(),
            _ => None,
        });

        let email = object
            .get("email")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| validate_email(email))
            .map(str::to_string);

        for (key, kept) in [
            ("name", name.is_some()),
            ("age", age.is_some()),
            ("email", email.is_some()),
        ] {
            if !kept && object.get(key).is_some_and(|v| !v.is_null()) {
                tracing::debug!(field = key, "Dropping unusable extracted field");
            }
        }

        Self { name, age, email }
    }

    /// Returns true if no field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.email.is_none()
    }
}

/// A well-formed decision: where to go next and what to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDecision {
    pub next_action: NextAction,
    pub bot_message: String,
    pub extracted_data: Option<ExtractedFields>,
}

impl ConversationDecision {
    /// Builds a decision from a parsed JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::MissingField` if `next_action` or
    /// `bot_message` is absent or not a string.
    pub fn from_value(value: &Value) -> Result<Self, ExtractionError> {
        let next_action = value
            .get("next_action")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractionError::MissingField("next_action".to_string()))?;

        let bot_message = value
            .get("bot_message")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractionError::MissingField("bot_message".to_string()))?;

        let extracted_data = value
            .get("extracted_data")
            .filter(|data| data.is_object())
            .map(ExtractedFields::from_value);

        Ok(Self {
            next_action: NextAction::parse(next_action),
            bot_message: bot_message.to_string(),
            extracted_data,
        })
    }
}
