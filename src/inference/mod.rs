//! External collaborators of the translation pipeline.
//!
//! The pipeline only sees the traits defined here; the HTTP clients are the
//! production implementations and tests substitute in-process fakes.

pub mod embedder;
pub mod fetch;
pub mod llm;

pub use embedder::{Embedder, InputType, VoyageEmbedder};
pub use fetch::{HttpSpecFetcher, SpecFetcher};
pub use llm::{AnthropicModel, CompletionRequest, LanguageModel};

use crate::error::{AppError, Result};
use std::time::Duration;

/// Shared reqwest client builder so every collaborator honours the same timeout.
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::TransportError(format!("Failed to build HTTP client: {}", e)))
}
