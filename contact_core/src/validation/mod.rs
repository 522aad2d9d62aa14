//! Validation and normalization of contact submissions

pub mod rules;

pub use rules::{is_honeypot_filled, validate_email, validate_message, validate_name};

use validator::ValidationError;

use crate::error::AppError;
use crate::models::{ContactRequest, Submission};

/// A rejected field and the text shown to the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn from_rule(field: &'static str, error: ValidationError) -> Self {
        let message = error
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid {}.", field));
        Self { field, message }
    }
}

impl From<FieldError> for AppError {
    fn from(err: FieldError) -> Self {
        AppError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(Submission),
    /// Honeypot was filled. Answer as if sent, deliver nothing.
    Spam,
    Invalid(FieldError),
}

/// Checks run name, email, message; the first failure wins.
pub fn validate_submission(request: &ContactRequest, max_message_length: usize) -> ValidationOutcome {
    if is_honeypot_filled(&request.website) {
        return ValidationOutcome::Spam;
    }

    let name = request.name.trim();
    let email = request.email.trim().to_lowercase();
    let message = request.message.trim();

    let checks = validate_name(name)
        .map_err(|e| FieldError::from_rule("name", e))
        .and_then(|_| validate_email(&email).map_err(|e| FieldError::from_rule("email", e)))
        .and_then(|_| {
            validate_message(message, max_message_length)
                .map_err(|e| FieldError::from_rule("message", e))
        });

    match checks {
        Ok(()) => ValidationOutcome::Valid(Submission {
            name: name.to_string(),
            email,
            message: message.to_string(),
        }),
        Err(err) => ValidationOutcome::Invalid(err),
    }
}
