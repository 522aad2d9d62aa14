//! Ordered delivery across the configured channels

use std::sync::Arc;
use std::time::Duration;

use super::{ChannelError, DeliveryChannel, DeliveryOutcome, FormRelayChannel, SmtpChannel};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::Submission;

#[derive(Clone)]
pub struct DeliveryRelay {
    channels: Vec<Arc<dyn DeliveryChannel>>,
    attempt_timeout: Duration,
}

impl DeliveryRelay {
    pub fn new(channels: Vec<Arc<dyn DeliveryChannel>>, attempt_timeout: Duration) -> Self {
        Self {
            channels,
            attempt_timeout,
        }
    }

    /// Primary first when usable, then the fallback when configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = config.delivery.attempt_timeout();
        let mut channels: Vec<Arc<dyn DeliveryChannel>> = Vec::new();

        if config.primary_usable() {
            match SmtpChannel::from_config(&config.smtp, timeout) {
                Ok(Some(smtp)) => channels.push(Arc::new(smtp)),
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "Could not set up SMTP - skipping SMTP"),
            }
        } else if config.smtp_configured() {
            tracing::warn!("SMTP credentials present but recipients or sender unusable - skipping SMTP");
        } else {
            tracing::warn!("SMTP is not configured. Set SMTP_HOST, SMTP_PORT, SMTP_USER, SMTP_PASS.");
        }

        if let Some(fallback) = FormRelayChannel::from_config(&config.fallback, timeout)? {
            tracing::info!(endpoint = %fallback.endpoint(), "Fallback form relay enabled");
            channels.push(Arc::new(fallback));
        }

        Ok(Self::new(channels, timeout))
    }

    pub fn is_configured(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Tries each channel in order and returns the name of the one that
    /// delivered.
    pub async fn deliver(&self, submission: &Submission) -> Result<&'static str> {
        if self.channels.is_empty() {
            return Err(AppError::NotConfigured);
        }

        for channel in &self.channels {
            let outcome = match tokio::time::timeout(self.attempt_timeout, channel.attempt(submission)).await {
                Ok(outcome) => outcome,
                Err(_) => DeliveryOutcome::Failed(ChannelError::Timeout),
            };

            match outcome {
                DeliveryOutcome::Sent => {
                    tracing::info!(channel = channel.name(), "Submission delivered");
                    return Ok(channel.name());
                }
                DeliveryOutcome::Failed(cause) => {
                    tracing::error!(channel = channel.name(), error = %cause, "Failed to send submission");
                }
            }
        }

        Err(AppError::DeliveryFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChannel {
        name: &'static str,
        outcome: DeliveryOutcome,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FakeChannel {
        fn new(name: &'static str, outcome: DeliveryOutcome) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: DeliveryOutcome::Sent,
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeliveryChannel for FakeChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(&self, _submission: &Submission) -> DeliveryOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }
    }

    fn relay_of(channels: &[&Arc<FakeChannel>]) -> DeliveryRelay {
        let channels = channels
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn DeliveryChannel>)
            .collect();
        DeliveryRelay::new(channels, Duration::from_secs(10))
    }

    fn submission() -> Submission {
        Submission {
            name: "Jo Lee".to_string(),
            email: "jo@example.com".to_string(),
            message: "Hello, I'd like to discuss a project.".to_string(),
        }
    }

    fn failed() -> DeliveryOutcome {
        DeliveryOutcome::Failed(ChannelError::Transport("connection refused".to_string()))
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let primary = FakeChannel::new("primary", DeliveryOutcome::Sent);
        let fallback = FakeChannel::new("fallback", DeliveryOutcome::Sent);
        let relay = relay_of(&[&primary, &fallback]);

        assert_eq!(relay.deliver(&submission()).await.unwrap(), "primary");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_uses_fallback() {
        let primary = FakeChannel::new("primary", failed());
        let fallback = FakeChannel::new("fallback", DeliveryOutcome::Sent);
        let relay = relay_of(&[&primary, &fallback]);

        assert_eq!(relay.deliver(&submission()).await.unwrap(), "fallback");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_all_channels_failing() {
        let primary = FakeChannel::new("primary", failed());
        let fallback = FakeChannel::new("fallback", DeliveryOutcome::Failed(ChannelError::Rejected(502)));
        let relay = relay_of(&[&primary, &fallback]);

        let err = relay.deliver(&submission()).await.unwrap_err();
        assert!(matches!(err, AppError::DeliveryFailed));
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_channels_is_not_configured() {
        let relay = DeliveryRelay::new(Vec::new(), Duration::from_secs(10));
        assert!(!relay.is_configured());
        assert!(matches!(relay.deliver(&submission()).await, Err(AppError::NotConfigured)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let primary = FakeChannel::slow("primary", Duration::from_secs(60));
        let fallback = FakeChannel::new("fallback", DeliveryOutcome::Sent);
        let relay = relay_of(&[&primary, &fallback]);

        assert_eq!(relay.deliver(&submission()).await.unwrap(), "fallback");
        assert_eq!(primary.calls(), 1);
    }

    #[tokio::test]
    async fn test_from_config_channel_order() {
        let relay = DeliveryRelay::from_config(&AppConfig::default()).unwrap();
        assert!(relay.channel_names().is_empty());

        let mut config = AppConfig::default();
        config.fallback.address = Some("inbox@example.com".to_string());
        let relay = DeliveryRelay::from_config(&config).unwrap();
        assert_eq!(relay.channel_names(), vec!["form-relay"]);

        config.smtp.host = Some("smtp.example.com".to_string());
        config.smtp.username = Some("relay@example.com".to_string());
        config.smtp.password = Some("secret".to_string());
        let relay = DeliveryRelay::from_config(&config).unwrap();
        assert_eq!(relay.channel_names(), vec!["form-relay"], "no recipients means no SMTP");

        config.smtp.recipients = vec!["owner@example.com".to_string()];
        let relay = DeliveryRelay::from_config(&config).unwrap();
        assert_eq!(relay.channel_names(), vec!["smtp", "form-relay"]);
    }

    #[test]
    fn test_malformed_recipient_leaves_fallback_only() {
        let mut config = AppConfig::default();
        config.smtp.host = Some("smtp.example.com".to_string());
        config.smtp.username = Some("relay@example.com".to_string());
        config.smtp.password = Some("secret".to_string());
        config.smtp.recipients = vec!["owner at example.com".to_string()];
        config.fallback.address = Some("inbox@example.com".to_string());

        let relay = DeliveryRelay::from_config(&config).unwrap();
        assert_eq!(relay.channel_names(), vec!["form-relay"]);
    }
}
