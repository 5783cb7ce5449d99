use crate::error::{AppError, Result};
use crate::persistence::{CacheStore, CacheSummary};
use crate::pipeline::CacheAddOutcome;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AddCacheRequest {
    pub api_spec_url: String,
}

#[derive(Debug, Serialize)]
pub struct CacheListResponse {
    pub path: String,
    pub entries: Vec<CacheSummary>,
}

fn require_cache(state: &AppState) -> Result<&CacheStore> {
    state
        .cache_store()
        .ok_or_else(|| AppError::ValidationError("Spec cache is disabled".to_string()))
}

/// POST /cache - Download, embed and cache a spec. A cached URL is left as is.
pub async fn add_cache_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddCacheRequest>,
) -> Result<Json<CacheAddOutcome>> {
    let cache = require_cache(&state)?;
    let outcome = state
        .translator
        .add_url_to_cache(&request.api_spec_url, cache)
        .await?;

    Ok(Json(outcome))
}

/// GET /cache - List cached specs.
pub async fn list_cache_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheListResponse>> {
    let cache = require_cache(&state)?;

    Ok(Json(CacheListResponse {
        path: cache.path().display().to_string(),
        entries: cache.summaries().await?,
    }))
}
