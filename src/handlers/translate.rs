use crate::error::{AppError, Result};
use crate::pipeline::Translation;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

fn default_use_cache() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    /// What the user wants done, in plain language
    pub user_query: String,
    /// URL of the OpenAPI spec (JSON) describing the target API
    pub api_spec_url: String,
    /// Set to false to bypass the spec cache for this request (default: true)
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

/// POST /translate - Turn a natural-language request into one HTTP request.
///
/// # Flow
/// 1. Validate input
/// 2. Load spec and endpoint embeddings (cache, else download and embed)
/// 3. Rank endpoints against the query, keep the top K
/// 4. Let the model narrow the candidates to the minimal set
/// 5. Let the model build the request from the full operation specs
///
/// A response the model garbled still returns 200, with
/// `http_request = {"error": "Failed to parse HTTP request"}`.
pub async fn translate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<Translation>> {
    if request.user_query.trim().is_empty() {
        return Err(AppError::ValidationError(
            "user_query cannot be empty".to_string(),
        ));
    }

    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        %request_id,
        url = %request.api_spec_url,
        use_cache = request.use_cache,
        "Translate request received"
    );

    let cache = if request.use_cache {
        state.cache_store()
    } else {
        None
    };

    let translation = state
        .translator
        .translate(&request.user_query, &request.api_spec_url, cache)
        .await?;

    tracing::debug!(
        %request_id,
        relevant = translation.relevant_endpoints.len(),
        "Translate request finished"
    );

    Ok(Json(translation))
}
