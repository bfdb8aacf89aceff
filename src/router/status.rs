//! Public instance status and metrics exposition.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;
use crate::{AppState, ServerError};

/// Public server status (configuration).
pub async fn status(State(config): State<Arc<Configuration>>) -> Json<Configuration> {
    Json(config.as_ref().clone())
}

/// Prometheus exposition, when the recorder is installed.
pub async fn metrics(State(state): State<AppState>) -> Result<String, ServerError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(ServerError::NotFound("metrics"))
}
