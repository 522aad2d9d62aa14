//! Fallback channel: third-party HTTP form relay

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;
use std::time::Duration;

use super::{ChannelError, DeliveryChannel, DeliveryOutcome};
use crate::config::FallbackConfig;
use crate::models::Submission;

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    #[serde(rename = "_subject")]
    subject: String,
    #[serde(rename = "_template")]
    template: &'static str,
    #[serde(rename = "_captcha")]
    captcha: &'static str,
}

pub struct FormRelayChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl FormRelayChannel {
    /// Returns `Ok(None)` when no fallback address is configured.
    pub fn from_config(config: &FallbackConfig, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(address) = &config.address else {
            return Ok(None);
        };

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Some(Self::with_client(client, &config.base_url, address)))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, address: &str) -> Self {
        Self {
            client,
            endpoint: endpoint_for(base_url, address),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// The destination address is a path segment, so it is percent-encoded.
pub fn endpoint_for(base_url: &str, address: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(address)
    )
}

#[async_trait]
impl DeliveryChannel for FormRelayChannel {
    fn name(&self) -> &'static str {
        "form-relay"
    }

    async fn attempt(&self, submission: &Submission) -> DeliveryOutcome {
        let payload = RelayPayload {
            name: &submission.name,
            email: &submission.email,
            message: &submission.message,
            subject: submission.subject(),
            template: "table",
            captcha: "false",
        };

        let response = match self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return DeliveryOutcome::Failed(ChannelError::Timeout),
            Err(e) => return DeliveryOutcome::Failed(ChannelError::Transport(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            DeliveryOutcome::Sent
        } else {
            DeliveryOutcome::Failed(ChannelError::Rejected(status.as_u16()))
        }
    }
}
