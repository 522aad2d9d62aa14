//! Cross-origin policy: CORS headers for allowed origins, 403 for the rest

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tower_http::cors::CorsLayer as TowerCorsLayer;

use crate::config::CorsConfig;
use crate::error::AppError;
use crate::AppState;

pub fn cors_layer_from_config(config: &CorsConfig) -> TowerCorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    TowerCorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([HeaderName::from_static("content-type")])
        .max_age(Duration::from_secs(3600))
}

/// Requests without an `Origin` header (same-origin, curl, server-to-server)
/// are let through.
pub fn origin_allowed(config: &CorsConfig, origin: Option<&str>) -> bool {
    match origin {
        None => true,
        Some(origin) => config.allowed_origins.iter().any(|allowed| allowed == origin),
    }
}

pub async fn origin_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    if origin_allowed(&state.config.cors, origin.as_deref()) {
        return next.run(request).await;
    }

    let origin = origin.unwrap_or_default();
    tracing::warn!(origin = %origin, path = %request.uri().path(), "Origin is not allowed");
    AppError::OriginNotAllowed(origin).into_response()
}
