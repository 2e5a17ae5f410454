//! Health and configuration handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use runway_core::EngineConfig;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/config - Effective engine thresholds
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<EngineConfig> {
    Json(state.engine.as_ref().clone())
}
