//! Main entry point for the contact relay binary

use anyhow::Result;
use contact_core::{
    create_app, delivery::SmtpChannel, run_server, AppConfig, AppState, DeliveryMode,
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());
    info!("Delivery mode: {}", DeliveryMode::from_config(&config));
    info!("Allowed origins: {}", config.cors.allowed_origins.join(", "));
    info!(
        "Rate limit: {} requests per {}s",
        config.rate_limit.max_requests,
        config.rate_limit.window().as_secs()
    );

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    spawn_smtp_verification(&config);

    let state = AppState::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize delivery channels: {}", e))?;

    info!("Delivery channels: {:?}", state.relay.channel_names());

    state.rate_limiter.spawn_pruner();
    info!(
        "Started rate limiter pruning task (every {}s)",
        state.rate_limiter.window().as_secs()
    );

    let app = create_app(state);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Checks the SMTP login once in the background. The outcome is only logged;
/// the server starts either way.
fn spawn_smtp_verification(config: &AppConfig) {
    if !config.primary_usable() {
        return;
    }

    // Setup errors are reported when the relay is built.
    let Ok(Some(channel)) = SmtpChannel::from_config(&config.smtp, config.delivery.attempt_timeout())
    else {
        return;
    };

    tokio::spawn(async move {
        channel.verify().await;
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        format!(
            "{}={},contact_core={},tower_http=debug,axum=debug",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
