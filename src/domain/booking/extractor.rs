//! Response extraction and sanitization.
//!
//! Turns the possibly-noisy text returned by the generation service into a
//! typed `ConversationDecision`. All tolerance for prose around the payload
//! lives here; callers only ever see a clean decision or nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use super::decision::ConversationDecision;

/// Maximum allowed response length (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```json\s*(\{.*?\})\s*```").expect("fenced json pattern is a valid regex")
});

/// Errors that can occur during sanitization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },
}

/// Errors that can occur while extracting a decision.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Sanitization failed: {0}")]
    Sanitization(#[from] SanitizationError),

    #[error("No JSON object found in response")]
    NoPayload,

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Sanitizes raw service output before it is scanned.
#[derive(Debug, Clone, Default)]
pub struct ResponseSanitizer;

impl ResponseSanitizer {
    /// Creates a new sanitizer.
    pub fn new() -> Self {
        Self
    }

    /// Rejects oversized responses and strips control characters
    /// other than newlines, carriage returns and tabs.
    pub fn sanitize(&self, response: &str) -> Result<String, SanitizationError> {
        if response.len() > MAX_RESPONSE_LENGTH {
            return Err(SanitizationError::TooLong {
                max: MAX_RESPONSE_LENGTH,
                actual: response.len(),
            });
        }

        Ok(response
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
            .collect())
    }
}

/// Extracts a `ConversationDecision` from raw service output.
#[derive(Debug, Clone, Default)]
pub struct DecisionExtractor {
    sanitizer: ResponseSanitizer,
}

impl DecisionExtractor {
    /// Creates a new extractor with the default sanitizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absence boundary: a decision, or `None` with the reason logged.
    pub fn extract(&self, response: &str) -> Option<ConversationDecision> {
        match self.try_extract(response) {
            Ok(decision) => Some(decision),
            Err(err) => {
                tracing::warn!(error = %err, "Could not extract a decision from service response");
                None
            }
        }
    }

    /// Extracts a decision, reporting why it failed.
    ///
    /// # Steps
    /// 1. Sanitize the raw response
    /// 2. Prefer a fenced ```json block, else the first balanced `{...}`
    /// 3. Parse the candidate as JSON
    /// 4. Require `next_action` and `bot_message`
    pub fn try_extract(&self, response: &str) -> Result<ConversationDecision, ExtractionError> {
        let sanitized = self.sanitizer.sanitize(response)?;

        let candidate = Self::find_candidate(&sanitized).ok_or(ExtractionError::NoPayload)?;

        let value: Value = serde_json::from_str(candidate).map_err(|e| {
            tracing::debug!(candidate, "Candidate payload is not valid JSON");
            ExtractionError::ParseError(e.to_string())
        })?;

        ConversationDecision::from_value(&value)
    }

    fn find_candidate(s: &str) -> Option<&str> {
        if let Some(captures) = FENCED_JSON.captures(s) {
            return captures.get(1).map(|m| m.as_str());
        }

        let start = s.find('{')?;
        Self::balanced_object(s, start)
    }

    /// Returns the object starting at `start`, tracking strings and escapes
    /// so braces inside string values do not close it early.
    fn balanced_object(s: &str, start: usize) -> Option<&str> {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escape_next = false;

        for (offset, c) in s[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                _ if in_string => {}
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&s[start..start + offset + 1]);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::{BookingStage, NextAction};

    mod sanitizer {
        use super::*;

        #[test]
        fn passes_clean_text_through() {
            let sanitizer = ResponseSanitizer::new();
            assert_eq!(sanitizer.sanitize("Hello, world!"), Ok("Hello, world!".to_string()));
        }

        #[test]
        fn rejects_too_long_response() {
            let sanitizer = ResponseSanitizer::new();
            let long = "a".repeat(MAX_RESPONSE_LENGTH + 1);
            assert!(matches!(
                sanitizer.sanitize(&long),
                Err(SanitizationError::TooLong { .. })
            ));
        }

        #[test]
        fn removes_control_characters_but_keeps_whitespace() {
            let sanitizer = ResponseSanitizer::new();
            let result = sanitizer.sanitize("Hel\x00lo\n\tWor\x07ld\r").unwrap();
            assert_eq!(result, "Hello\n\tWorld\r");
        }
    }

    mod extractor {
        use super::*;

        #[test]
        fn extracts_plain_json() {
            let extractor = DecisionExtractor::new();
            let decision = extractor
                .extract(r#"{"next_action": "ASK_AGE", "bot_message": "How old are you?"}"#)
                .unwrap();

            assert_eq!(decision.next_action, NextAction::Stage(BookingStage::AskAge));
            assert_eq!(decision.bot_message, "How old are you?");
        }

        #[test]
        fn extracts_from_fenced_block_with_prose() {
            let extractor = DecisionExtractor::new();
            let response = r#"Sure! Here is my answer:

```json
{
  "next_action": "ASK_EMAIL",
  "bot_message": "Thanks! What's your email?",
  "extracted_data": {"age": 25}
}
```

Let me know if anything else is needed."#;

            let decision = extractor.extract(response).unwrap();
            assert_eq!(decision.next_action, NextAction::Stage(BookingStage::AskEmail));
            assert_eq!(decision.extracted_data.unwrap().age, Some(25));
        }

        #[test]
        fn fence_label_is_case_insensitive() {
            let extractor = DecisionExtractor::new();
            let response = "```JSON\n{\"next_action\": \"END_CONVERSATION\", \"bot_message\": \"Bye\"}\n```";
            assert!(extractor.extract(response).is_some());
        }

        #[test]
        fn falls_back_to_first_object_in_prose() {
            let extractor = DecisionExtractor::new();
            let response = r#"Okay. {"next_action": "REJECT_BOOKING", "bot_message": "Sorry, you must be 18."} Anything else?"#;
            let decision = extractor.extract(response).unwrap();
            assert_eq!(decision.next_action, NextAction::Stage(BookingStage::RejectBooking));
        }

        #[test]
        fn fallback_handles_nested_extracted_data() {
            let extractor = DecisionExtractor::new();
            let response = r#"Result: {"next_action": "ASK_AGE", "bot_message": "Hi {Alex}!", "extracted_data": {"name": "Alex"}} done"#;
            let decision = extractor.extract(response).unwrap();
            assert_eq!(decision.bot_message, "Hi {Alex}!");
            assert_eq!(
                decision.extracted_data.unwrap().name.as_deref(),
                Some("Alex")
            );
        }

        #[test]
        fn fallback_survives_multibyte_prose() {
            let extractor = DecisionExtractor::new();
            let response = r#"Très bien — {"next_action": "ASK_AGE", "bot_message": "Âge ?"}"#;
            let decision = extractor.extract(response).unwrap();
            assert_eq!(decision.bot_message, "Âge ?");
        }

        #[test]
        fn keeps_unrecognized_next_action() {
            let extractor = DecisionExtractor::new();
            let decision = extractor
                .extract(r#"{"next_action": "REQUEST_CLARIFICATION", "bot_message": "Hmm?"}"#)
                .unwrap();
            assert_eq!(
                decision.next_action,
                NextAction::Unrecognized("REQUEST_CLARIFICATION".to_string())
            );
        }

        #[test]
        fn no_payload_is_absence() {
            let extractor = DecisionExtractor::new();
            assert_eq!(
                extractor.try_extract("I'd be happy to help with that!"),
                Err(ExtractionError::NoPayload)
            );
            assert!(extractor.extract("I'd be happy to help with that!").is_none());
        }

        #[test]
        fn unterminated_object_is_absence() {
            let extractor = DecisionExtractor::new();
            assert_eq!(
                extractor.try_extract(r#"{"next_action": "ASK_AGE", "bot_message": "#),
                Err(ExtractionError::NoPayload)
            );
        }

        #[test]
        fn invalid_json_is_absence() {
            let extractor = DecisionExtractor::new();
            let result = extractor.try_extract("{next_action: ASK_AGE}");
            assert!(matches!(result, Err(ExtractionError::ParseError(_))));
        }

        #[test]
        fn incomplete_decision_is_absence() {
            let extractor = DecisionExtractor::new();
            let result = extractor.try_extract(r#"{"next_action": "ASK_AGE"}"#);
            assert_eq!(
                result,
                Err(ExtractionError::MissingField("bot_message".to_string()))
            );
        }

        #[test]
        fn oversized_response_is_absence() {
            let extractor = DecisionExtractor::new();
            let response = format!(
                r#"{{"next_action": "ASK_AGE", "bot_message": "{}"}}"#,
                "a".repeat(MAX_RESPONSE_LENGTH)
            );
            assert!(matches!(
                extractor.try_extract(&response),
                Err(ExtractionError::Sanitization(_))
            ));
        }
    }
}
