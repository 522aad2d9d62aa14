//! Mail bodies built from a submission

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Submission;

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn render_text(submission: &Submission, submitted_at: DateTime<Utc>) -> String {
    [
        format!("Name: {}", submission.name),
        format!("Email: {}", submission.email),
        format!("Submitted: {}", timestamp(submitted_at)),
        String::new(),
        "Message:".to_string(),
        submission.message.clone(),
    ]
    .join("\n")
}

pub fn render_html(submission: &Submission, submitted_at: DateTime<Utc>) -> String {
    let message = escape_html(&submission.message).replace('\n', "<br/>");

    format!(
        "<h2>New Portfolio Contact Message</h2>\n\
         <p><strong>Name:</strong> {}</p>\n\
         <p><strong>Email:</strong> {}</p>\n\
         <p><strong>Submitted:</strong> {}</p>\n\
         <p><strong>Message:</strong></p>\n\
         <p>{}</p>\n",
        escape_html(&submission.name),
        escape_html(&submission.email),
        timestamp(submitted_at),
        message,
    )
}

/// Display name for the From header. Double quotes would end the quoted
/// phrase early.
pub fn sender_display_name(name: &str) -> String {
    name.replace('"', "'")
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
