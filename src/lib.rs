//! HTTP Translator - natural-language requests to OpenAPI-backed HTTP calls
//!
//! The library exposes the retrieval-and-selection pipeline: spec caching,
//! endpoint extraction, embedding ranking, schema closure and the two
//! LLM-mediated selection steps, plus the axum handlers that serve it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod inference;
pub mod ingestion;
pub mod persistence;
pub mod pipeline;
pub mod retrieval;
pub mod schema;
pub mod selection;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{
    add_cache_handler, health_handler, list_cache_handler, ready_handler, translate_handler,
};
pub use inference::{Embedder, InputType, LanguageModel, SpecFetcher};
pub use ingestion::{extract_endpoint_documents, EndpointDocument, HttpMethod};
pub use persistence::{CacheEntry, CacheStore};
pub use pipeline::{CacheAddOutcome, PipelineStage, Translation, Translator, TranslatorSettings};
pub use selection::{ConstructedRequest, HttpRequestOutcome};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Router with every API route, without middleware or metrics.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/translate", post(translate_handler))
        .route("/cache", post(add_cache_handler).get(list_cache_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}
