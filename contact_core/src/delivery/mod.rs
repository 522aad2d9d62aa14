//! Delivery channels for accepted submissions.
//!
//! ```text
//! Submission
//!     → DeliveryRelay (ordered channel list, per-attempt timeout)
//!         → SmtpChannel       (primary, authenticated mail relay)
//!         → FormRelayChannel  (fallback, third-party HTTP form relay)
//!     → first Sent wins; all Failed → DeliveryFailed; empty → NotConfigured
//! ```

pub mod form_relay;
pub mod message;
pub mod relay;
pub mod smtp;

pub use form_relay::FormRelayChannel;
pub use relay::DeliveryRelay;
pub use smtp::SmtpChannel;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Submission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Failed(ChannelError),
}

/// Why a single channel attempt did not deliver. Logged, never shown to the
/// submitter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("could not build message: {0}")]
    Build(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected with status {0}")]
    Rejected(u16),

    #[error("attempt timed out")]
    Timeout,
}

/// One way of getting a submission to the site owner.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, submission: &Submission) -> DeliveryOutcome;
}
