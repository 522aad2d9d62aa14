//! Configuration health check

use axum::{extract::State, Json};

use crate::{models::HealthReport, AppState};

/// Reports which delivery channels the loaded configuration enables.
/// Reads only immutable config, so repeated calls agree.
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::from_config(&state.config))
}
