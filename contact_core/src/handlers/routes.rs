//! Route table

use axum::{
    routing::{get, post},
    Router,
};

use super::{contact::handle_submit, health::handle_health};
use crate::AppState;

/// The `/api/contact` paths are what the site's form already calls.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handle_health))
        .route("/submit", post(handle_submit))
        .route("/api/contact/health", get(handle_health))
        .route("/api/contact", post(handle_submit))
}
