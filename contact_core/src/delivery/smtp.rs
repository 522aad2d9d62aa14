//! Primary channel: authenticated SMTP relay

use async_trait::async_trait;
use chrono::Utc;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use super::message::{render_html, render_text, sender_display_name};
use super::{ChannelError, DeliveryChannel, DeliveryOutcome};
use crate::config::SmtpConfig;
use crate::models::Submission;

pub struct SmtpChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpChannel {
    /// Returns `Ok(None)` when host, credentials or recipients are missing.
    pub fn from_config(config: &SmtpConfig, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let (Some(host), Some(username), Some(password)) =
            (&config.host, &config.username, &config.password)
        else {
            return Ok(None);
        };

        if config.recipients.is_empty() {
            return Ok(None);
        }

        let builder = if config.implicit_tls() {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .timeout(Some(timeout))
            .build();

        let from_address = config.from_address.as_deref().unwrap_or(username);
        let from = Mailbox::new(
            Some(sender_display_name(&config.from_name)),
            from_address.parse::<Address>()?,
        );

        let recipients = config
            .recipients
            .iter()
            .map(|r| r.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Self {
            transport,
            from,
            recipients,
        }))
    }

    /// Opens a connection and authenticates. Startup diagnostics only.
    pub async fn verify(&self) -> bool {
        match self.transport.test_connection().await {
            Ok(true) => {
                tracing::info!("SMTP connection is ready");
                true
            }
            Ok(false) => {
                tracing::error!("SMTP verification failed: server did not accept connection");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "SMTP verification failed");
                false
            }
        }
    }

    pub fn build_message(&self, submission: &Submission) -> Result<Message, ChannelError> {
        let submitted_at = Utc::now();

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(submission.subject());

        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        match submission.email.parse::<Address>() {
            Ok(address) => builder = builder.reply_to(Mailbox::new(None, address)),
            Err(e) => {
                tracing::warn!(error = %e, "Submitter address not usable as Reply-To, omitting");
            }
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                render_text(submission, submitted_at),
                render_html(submission, submitted_at),
            ))
            .map_err(|e| ChannelError::Build(e.to_string()))
    }
}

#[async_trait]
impl DeliveryChannel for SmtpChannel {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn attempt(&self, submission: &Submission) -> DeliveryOutcome {
        let message = match self.build_message(submission) {
            Ok(message) => message,
            Err(e) => return DeliveryOutcome::Failed(e),
        };

        match self.transport.send(message).await {
            Ok(_) => DeliveryOutcome::Sent,
            Err(e) => DeliveryOutcome::Failed(ChannelError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            username: Some("relay@example.com".to_string()),
            password: Some("secret".to_string()),
            recipients: vec!["owner@example.com".to_string(), "backup@example.com".to_string()],
            from_name: r#"Portfolio "Contact""#.to_string(),
            from_address: Some("noreply@example.com".to_string()),
            ..SmtpConfig::default()
        }
    }

    fn submission() -> Submission {
        Submission {
            name: "Jo Lee".to_string(),
            email: "jo@example.com".to_string(),
            message: "Hello <there>\nSecond line".to_string(),
        }
    }

    #[test]
    fn test_unusable_without_credentials_or_recipients() {
        let timeout = Duration::from_secs(10);

        let mut missing_password = config();
        missing_password.password = None;
        assert!(SmtpChannel::from_config(&missing_password, timeout).unwrap().is_none());

        let mut no_recipients = config();
        no_recipients.recipients.clear();
        assert!(SmtpChannel::from_config(&no_recipients, timeout).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_message_headers_and_bodies() {
        let channel = SmtpChannel::from_config(&config(), Duration::from_secs(10))
            .unwrap()
            .expect("channel should be usable");

        let message = channel.build_message(&submission()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Portfolio contact from Jo Lee"));
        assert!(raw.contains("Reply-To: jo@example.com"));
        assert!(raw.contains("owner@example.com"));
        assert!(raw.contains("backup@example.com"));
        assert!(raw.contains("Portfolio 'Contact'"));
        assert!(raw.contains("noreply@example.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Hello &lt;there&gt;<br/>Second line"));
    }
}
