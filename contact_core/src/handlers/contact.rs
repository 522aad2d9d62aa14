//! Contact form submission handler

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    extractors::ContactJson,
    middleware::rate_limit::caller_id,
    models::{ContactRequest, ContactResponse},
    validation::{validate_submission, ValidationOutcome},
    AppState,
};

pub const SENT_MESSAGE: &str = "Message sent successfully. I will reply soon.";
pub const HONEYPOT_MESSAGE: &str = "Message sent successfully.";

/// Honeypot, then field validation, then the rate limit, then delivery.
/// Nothing is sent unless every check before delivery passed.
pub async fn handle_submit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ContactJson(request): ContactJson<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    let caller = caller_id(
        &headers,
        peer.map(|ConnectInfo(addr)| addr),
        state.config.server.trust_proxy,
    );
    let span = tracing::info_span!("submission", id = %Uuid::new_v4(), caller = %caller);

    process_submission(state, caller, request)
        .instrument(span)
        .await
}

async fn process_submission(
    state: AppState,
    caller: String,
    request: ContactRequest,
) -> Result<Json<ContactResponse>> {
    let submission = match validate_submission(&request, state.config.contact.max_message_length) {
        ValidationOutcome::Valid(submission) => submission,
        ValidationOutcome::Spam => {
            info!("Honeypot field filled, dropping submission");
            return Ok(Json(ContactResponse::success(HONEYPOT_MESSAGE)));
        }
        ValidationOutcome::Invalid(err) => {
            debug!(field = err.field, "Submission failed validation");
            return Err(AppError::from(err));
        }
    };

    if let Err(err) = state.rate_limiter.check(&caller) {
        warn!(
            limit = err.limit,
            retry_after_seconds = err.retry_after_seconds,
            "Rate limit exceeded"
        );
        return Err(err.into());
    }

    let channel = state.relay.deliver(&submission).await?;
    info!(channel = channel, "Contact message relayed");

    Ok(Json(ContactResponse::success(SENT_MESSAGE)))
}
