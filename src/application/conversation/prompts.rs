//! Instruction builders for each stage of the booking dialogue.
//!
//! Each builder names the action the model should choose next. The
//! engine never trusts that choice; it is only a hint.

use crate::domain::booking::BookingStage;

/// Instruction text plus the stage the model is asked to pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub text: String,
    pub target: BookingStage,
}

impl Instruction {
    fn new(target: BookingStage, text: String) -> Self {
        Self { text, target }
    }
}

/// A plausible name was given; ask for the age next.
pub fn acknowledge_name(name: &str) -> Instruction {
    Instruction::new(
        BookingStage::AskAge,
        format!(
            "User provided their name: '{name}'.\n\
             Task: Acknowledge the name '{name}'. Ask the user for their age as the next step required for hotel booking.\n\
             Set next_action to 'ASK_AGE'. Include the name in extracted_data."
        ),
    )
}

/// An adult age was given; ask for the email next.
pub fn request_email(name: Option<&str>, age: u32, min_age: u32) -> Instruction {
    let name = name.unwrap_or("there");
    Instruction::new(
        BookingStage::AskEmail,
        format!(
            "User '{name}' provided their age: {age} (which is >= {min_age}).\n\
             Task: Acknowledge the age. Ask the user for their email address as the next step.\n\
             Set next_action to 'ASK_EMAIL'. Include the age in extracted_data."
        ),
    )
}

/// The guest is under the minimum age; decline politely and stop asking.
pub fn reject_underage(name: Option<&str>, age: u32, min_age: u32) -> Instruction {
    let name = name.unwrap_or("there");
    Instruction::new(
        BookingStage::RejectBooking,
        format!(
            "User '{name}' provided their age: {age} (which is < {min_age}).\n\
             Task: Politely explain that the user cannot book a hotel because the minimum age is {min_age}. Do not ask further questions.\n\
             Set next_action to 'REJECT_BOOKING'. Include the age in extracted_data."
        ),
    )
}

/// A valid email was given; produce the booking confirmation.
pub fn confirm_booking(name: Option<&str>, age: Option<u32>, email: &str) -> Instruction {
    let name = name.unwrap_or("Guest");
    let age = age.map_or_else(|| "unknown".to_string(), |age| age.to_string());
    Instruction::new(
        BookingStage::ConfirmBooking,
        format!(
            "User '{name}' (age {age}) provided their email: '{email}'.\n\
             Task: Generate a friendly hotel booking confirmation message. State the booking is successful and details will be sent to the email.\n\
             Set next_action to 'CONFIRM_BOOKING'. Include the email in extracted_data."
        ),
    )
}

/// Free text after the booking concluded.
pub fn follow_up(utterance: &str, previous: BookingStage) -> Instruction {
    Instruction::new(
        BookingStage::EndConversation,
        format!(
            "The user said: '{utterance}'. The previous interaction ended with state: '{previous}'.\n\
             Task: Respond politely. Ask if there's anything else or if they'd like to start a new booking request.\n\
             Set next_action to 'END_CONVERSATION' unless they clearly want to restart."
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_instruction_targets_age() {
        let instruction = acknowledge_name("Alex");
        assert_eq!(instruction.target, BookingStage::AskAge);
        assert!(instruction.text.contains("'Alex'"));
        assert!(instruction.text.contains("'ASK_AGE'"));
    }

    #[test]
    fn age_instructions_mention_threshold() {
        let adult = request_email(Some("Alex"), 18, 18);
        assert_eq!(adult.target, BookingStage::AskEmail);
        assert!(adult.text.contains("18 (which is >= 18)"));

        let minor = reject_underage(None, 17, 18);
        assert_eq!(minor.target, BookingStage::RejectBooking);
        assert!(minor.text.contains("User 'there'"));
        assert!(minor.text.contains("minimum age is 18"));
    }

    #[test]
    fn confirmation_references_stored_details() {
        let instruction = confirm_booking(Some("Alex"), Some(25), "alex@example.com");
        assert_eq!(instruction.target, BookingStage::ConfirmBooking);
        assert!(instruction.text.contains("User 'Alex' (age 25)"));
        assert!(instruction.text.contains("'alex@example.com'"));
    }

    #[test]
    fn follow_up_names_previous_stage() {
        let instruction = follow_up("thanks!", BookingStage::RejectBooking);
        assert_eq!(instruction.target, BookingStage::EndConversation);
        assert!(instruction.text.contains("state: 'REJECT_BOOKING'"));
    }
}
