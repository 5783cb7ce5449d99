use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum AppError {
    /// A value an upstream stage should have produced is absent.
    #[error("Missing input: {0}")]
    InputMissing(String),

    #[error("Transport failure: {0}")]
    TransportError(String),

    /// A collaborator answered, but with data we cannot use.
    #[error("Model response invalid: {0}")]
    ModelError(String),

    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// The service itself is misconfigured, e.g. a missing API key.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Only ever logged; the cache is treated as empty instead.
    #[error("Cache file corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Cache persistence failed: {0}")]
    PersistenceError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InputMissing(msg) => {
                tracing::warn!(error = %msg, "Pipeline input missing");
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::TransportError(e) => {
                tracing::error!(error = %e, "Upstream transport error");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::ModelError(e) => {
                tracing::error!(error = %e, "Collaborator returned unusable data");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::ValidationError(msg) => {
                tracing::warn!(error = %msg, "Validation error");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::ConfigError(msg) => {
                tracing::error!(error = %msg, "Service misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::CacheCorrupt(msg) | AppError::PersistenceError(msg) => {
                tracing::error!(error = %msg, "Cache error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::TransportError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
