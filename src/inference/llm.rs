//! Completion collaborator.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A single-turn prompt with its token budget.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub max_tokens: u32,
}

/// Maps a prompt to text. No system prompt is sent.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}

/// Client for the Anthropic messages API.
pub struct AnthropicModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl AnthropicModel {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("ANTHROPIC_API_KEY is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key.trim())
                .map_err(|_| AppError::ConfigError("invalid Anthropic API key".to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl LanguageModel for AnthropicModel {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages: vec![Message {
                role: "user",
                content: request.prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::TransportError(format!(
                "Anthropic returned {}: {}",
                status, text
            )));
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            AppError::ModelError(format!("Failed to parse Anthropic response: {}", e))
        })?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            model = %self.model,
            max_tokens = request.max_tokens,
            response_chars = text.len(),
            "Completion received"
        );

        Ok(text)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
