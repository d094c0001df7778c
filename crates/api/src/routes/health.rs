//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of sagas the state store is tracking.
    pub sagas: usize,
}

/// GET /health — reports healthy while the state store answers.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sagas = state.orchestrator.saga_count().await;
    Json(HealthResponse {
        status: "ok",
        sagas,
    })
}
