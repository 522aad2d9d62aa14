//! Application error types and handling

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ContactResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Origin not allowed: {0}")]
    OriginNotAllowed(String),

    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("No delivery channel is configured")]
    NotConfigured,

    #[error("All delivery channels failed")]
    DeliveryFailed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DeliveryFailed | AppError::IoError(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable text shown to the submitter. Transport details never leak here.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::InvalidBody(_) => "Invalid request body.".to_string(),
            AppError::PayloadTooLarge => "Request body is too large.".to_string(),
            AppError::OriginNotAllowed(_) => "Origin is not allowed.".to_string(),
            AppError::RateLimited { .. } => {
                "Too many requests. Please wait a few minutes and try again.".to_string()
            }
            AppError::NotConfigured => {
                "Email service is not configured yet. Please try again later.".to_string()
            }
            AppError::DeliveryFailed => "Failed to send message. Please try again.".to_string(),
            AppError::IoError(_) | AppError::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::NotConfigured => tracing::warn!("Submission rejected: no delivery channel configured"),
            AppError::IoError(err) => tracing::error!("IO error: {:?}", err),
            AppError::Other(err) => tracing::error!("Unexpected error: {:?}", err),
            _ => {}
        }

        let body = Json(ContactResponse::failure(self.public_message()));
        let mut response = (status, body).into_response();

        if let AppError::RateLimited { retry_after_seconds } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
