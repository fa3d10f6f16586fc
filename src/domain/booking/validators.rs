//! Field validators for guest input.
//!
//! Pure checks with no side effects. The minimum booking age is not
//! enforced here: an under-age guest gave a valid age, and the engine
//! routes that to a rejection instead of a reprompt.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Reasons an age answer is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAge {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),

    #[error("age must be positive, got {0}")]
    NotPositive(i64),

    #[error("age {0} is out of range")]
    TooLarge(i64),
}

/// Returns true iff `text` has the shape `local-part@domain.tld`.
pub fn validate_email(text: &str) -> bool {
    EMAIL_PATTERN.is_match(text)
}

/// Parses an age answer, rejecting non-integers and values ≤ 0.
pub fn validate_age(text: &str) -> Result<u32, InvalidAge> {
    let trimmed = text.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| InvalidAge::NotANumber(trimmed.to_string()))?;

    if value <= 0 {
        return Err(InvalidAge::NotPositive(value));
    }

    u32::try_from(value).map_err(|_| InvalidAge::TooLarge(value))
}

/// Returns true iff the trimmed text is longer than one character.
pub fn is_nontrivial_name(text: &str) -> bool {
    text.trim().chars().count() > 1
}
