//! JSON extractor that answers in the contact response shape

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Like [`axum::Json`], but rejections become [`AppError`] so malformed or
/// oversized bodies still get `{ok:false, message}`.
pub struct ContactJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ContactJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ContactJson(value)),
            Err(rejection) => Err(map_rejection(rejection)),
        }
    }
}

fn map_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("Rejected oversized request body");
        return AppError::PayloadTooLarge;
    }

    tracing::debug!(error = %rejection.body_text(), "Rejected malformed request body");
    AppError::InvalidBody(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactRequest;
    use axum::http::header::CONTENT_TYPE;

    async fn extract(body: &'static str, content_type: Option<&str>) -> Result<ContactRequest, AppError> {
        let mut builder = Request::builder().method("POST").uri("/submit");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let request = builder.body(Body::from(body)).unwrap();
        ContactJson::<ContactRequest>::from_request(request, &())
            .await
            .map(|ContactJson(value)| value)
    }

    #[tokio::test]
    async fn test_valid_body() {
        let request = extract(r#"{"name":"Jo","email":"jo@example.com"}"#, Some("application/json"))
            .await
            .unwrap();
        assert_eq!(request.name, "Jo");
        assert!(request.website.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = extract("{not json", Some("application/json")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidBody(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let err = extract(r#"{"name":"Jo"}"#, None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
