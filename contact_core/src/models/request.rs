//! Request and response models

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

/// Contact form body as posted by the site. Missing, null or non-string
/// fields deserialize as empty strings so validation can name the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    #[serde(deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub email: String,
    #[serde(deserialize_with = "string_or_empty")]
    pub message: String,
    /// Honeypot. Hidden from humans, so anything here came from a bot.
    #[serde(deserialize_with = "string_or_empty")]
    pub website: String,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrAny {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match StringOrAny::deserialize(deserializer)? {
        StringOrAny::Text(value) => value,
        StringOrAny::Other(_) => String::new(),
    })
}

/// A submission that passed validation: trimmed, with a lowercased email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Submission {
    pub fn subject(&self) -> String {
        format!("Portfolio contact from {}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactResponse {
    pub ok: bool,
    pub message: String,
}

impl ContactResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}
