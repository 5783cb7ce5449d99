use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Cache file in use, absent when caching is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
}

/// GET /health - Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - Readiness probe (spec cache loaded)
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    let (code, status) = if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    let cache_file = state
        .cache_store()
        .map(|cache| cache.path().display().to_string());

    (
        code,
        Json(ReadyResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            cache_file,
        }),
    )
}
