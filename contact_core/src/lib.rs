//! Core library for the contact relay: validation, rate limiting, delivery
//! channels and the HTTP surface.

pub mod config;
pub mod delivery;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validation;

pub use config::AppConfig;
pub use delivery::{DeliveryChannel, DeliveryOutcome, DeliveryRelay};
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use middleware::rate_limit::RateLimiter;
pub use models::{ContactRequest, ContactResponse, DeliveryMode, HealthReport, Submission};

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub rate_limiter: RateLimiter,
    pub relay: DeliveryRelay,
}

impl AppState {
    /// Builds the limiter and the channel list from the configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let relay = DeliveryRelay::from_config(&config)?;
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Ok(Self {
            config: Arc::new(config),
            rate_limiter,
            relay,
        })
    }

    pub fn with_relay(mut self, relay: DeliveryRelay) -> Self {
        self.relay = relay;
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let mut router = Router::new().merge(create_routes());

    router = router.layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    router = router.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::cors::origin_guard,
    ));

    router = router.layer(middleware::cors::cors_layer_from_config(&state.config.cors));

    router = router.layer(axum_middleware::from_fn(
        middleware::security_headers::security_headers_middleware,
    ));

    router = middleware::logging::with_request_logging(router);

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
