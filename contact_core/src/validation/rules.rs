//! Field rules for contact submissions

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 80;
pub const EMAIL_MAX_CHARS: usize = 120;
pub const MESSAGE_MIN_CHARS: usize = 10;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Expects an already trimmed value.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(rule_error("name_length", "Please enter a valid name."));
    }
    Ok(())
}

/// Expects an already trimmed and lowercased value.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.chars().count() > EMAIL_MAX_CHARS || !EMAIL_REGEX.is_match(email) {
        return Err(rule_error("email_format", "Please enter a valid email address."));
    }
    Ok(())
}

/// Expects an already trimmed value.
pub fn validate_message(message: &str, max_chars: usize) -> Result<(), ValidationError> {
    let len = message.chars().count();
    if !(MESSAGE_MIN_CHARS..=max_chars).contains(&len) {
        return Err(rule_error(
            "message_length",
            format!(
                "Message must be between {} and {} characters.",
                MESSAGE_MIN_CHARS, max_chars
            ),
        ));
    }
    Ok(())
}

pub fn is_honeypot_filled(website: &str) -> bool {
    !website.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(err: ValidationError) -> String {
        err.message.map(|m| m.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("Jo").is_ok());
        assert!(validate_name(&"x".repeat(80)).is_ok());
        assert!(validate_name("J").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(81)).is_err());
        assert_eq!(message_of(validate_name("J").unwrap_err()), "Please enter a valid name.");
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        assert!(validate_name("Zoë").is_ok());
        assert!(validate_name(&"é".repeat(80)).is_ok());
    }

    #[test]
    fn test_email_pattern() {
        assert!(validate_email("jo@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());

        for invalid in ["", "notanemail", "@example.com", "jo@", "jo@example", "jo @example.com", "jo@@example.com"] {
            assert!(validate_email(invalid).is_err(), "{} should be rejected", invalid);
        }
    }

    #[test]
    fn test_email_length_limit() {
        let local = "a".repeat(EMAIL_MAX_CHARS - "@example.com".len());
        assert!(validate_email(&format!("{}@example.com", local)).is_ok());
        assert!(validate_email(&format!("a{}@example.com", local)).is_err());
    }

    #[test]
    fn test_message_bounds_name_the_limit() {
        assert!(validate_message("0123456789", 4000).is_ok());
        assert!(validate_message("too short", 4000).is_err());

        let err = validate_message(&"x".repeat(51), 50).unwrap_err();
        assert_eq!(err.code, "message_length");
        assert_eq!(message_of(err), "Message must be between 10 and 50 characters.");
    }

    #[test]
    fn test_honeypot() {
        assert!(!is_honeypot_filled(""));
        assert!(!is_honeypot_filled("   "));
        assert!(is_honeypot_filled("http://spam.example"));
    }
}
