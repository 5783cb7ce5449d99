//! Spec download collaborator.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait SpecFetcher: Send + Sync {
    /// Download and parse the JSON document at `url`.
    async fn fetch(&self, url: &str) -> Result<Value>;
}

pub struct HttpSpecFetcher {
    client: reqwest::Client,
}

impl HttpSpecFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: super::build_http_client(timeout)?,
        })
    }
}

#[async_trait]
impl SpecFetcher for HttpSpecFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to download {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::TransportError(format!(
                "Spec download from {} returned {}",
                url, status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::TransportError(format!("Spec at {} is not JSON: {}", url, e)))
    }
}
