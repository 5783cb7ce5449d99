//! Embedding collaborator.
//!
//! Documents are embedded once per spec and cached; queries are embedded on
//! every call. Vectors are compared by dot product, which equals cosine
//! similarity only for unit-length outputs (Voyage models normalize).

use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which side of the retrieval problem a text is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Document,
    Query,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts` in order, returning one vector per input.
    async fn embed(
        &self,
        texts: &[String],
        model: &str,
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>>;
}

/// Client for the Voyage AI embeddings endpoint.
pub struct VoyageEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl VoyageEmbedder {
    pub fn new(api_key: Option<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Embedder for VoyageEmbedder {
    async fn embed(
        &self,
        texts: &[String],
        model: &str,
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("VOYAGE_API_KEY is not set".to_string()))?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| AppError::ConfigError("invalid Voyage API key".to_string()))?;

        let request = EmbeddingRequest {
            input: texts,
            model,
            input_type,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::TransportError(format!(
                "Voyage embeddings request failed ({}): {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::ModelError(format!("Failed to parse Voyage embedding response: {}", e))
        })?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(AppError::ModelError(format!(
                "Voyage returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        tracing::debug!(
            model,
            inputs = texts.len(),
            input_type = ?input_type,
            "Embeddings created"
        );

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: InputType,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
