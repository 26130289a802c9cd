//! Health Check Routes

use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use crate::server::server_core::ServerState;
use crate::server::types::{HealthResponse, LanguagesResponse, ModelLineup};
use crate::text::language_table;

fn health(state: &ServerState) -> HealthResponse {
    HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend.name().to_string(),
        device: state.backend.device(),
        uptime: state.uptime().as_secs(),
        models: ModelLineup::default(),
    }
}

/// `GET /`
pub async fn root(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(health(&state))
}

/// `GET /health`
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(health(&state))
}

/// `GET /languages`
pub async fn languages(State(state): State<Arc<ServerState>>) -> Json<LanguagesResponse> {
    let languages = language_table();
    Json(LanguagesResponse {
        count: languages.len(),
        languages,
        models: ModelLineup::default(),
        device: state.backend.device(),
    })
}
