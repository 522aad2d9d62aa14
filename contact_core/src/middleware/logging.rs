//! Request logging layer

use axum::Router;
use http::Request;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info_span;

/// Wraps the router in a trace layer that logs one span per request and
/// picks the level from the response status.
pub fn with_request_logging<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            })
            .on_request(|_request: &Request<_>, _span: &tracing::Span| {
                tracing::debug!("request started");
            })
            .on_response(|response: &http::Response<_>, latency: Duration, _span: &tracing::Span| {
                let status = response.status();
                let latency_ms = latency.as_millis();

                if status.is_server_error() {
                    tracing::error!(status = status.as_u16(), latency_ms = latency_ms, "server error response");
                } else if status.is_client_error() {
                    tracing::warn!(status = status.as_u16(), latency_ms = latency_ms, "client error response");
                } else {
                    tracing::info!(status = status.as_u16(), latency_ms = latency_ms, "request completed");
                }
            }),
    )
}
