use std::env;
use std::path::PathBuf;

const DEFAULT_MODEL_NAME: &str = "claude-sonnet-4-20250514";
const DEFAULT_EMBEDDING_MODEL: &str = "voyage-3.5";
const DEFAULT_CACHE_FILE: &str = "cache/api_cache.json";

/// Runtime configuration for the translator service and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Completion model used by both selection steps.
    pub model_name: String,
    /// Embedding model used for endpoint documents and queries.
    pub embedding_model: String,
    /// Number of ranked endpoints handed to the narrowing step.
    pub top_k_endpoints: usize,
    pub find_endpoints_max_tokens: u32,
    pub construct_request_max_tokens: u32,
    /// Path of the spec cache file. `None` disables caching entirely.
    pub cache_file: Option<PathBuf>,
    /// Timeout applied by every outbound HTTP client.
    pub request_timeout_secs: u64,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub voyage_api_key: Option<String>,
    pub voyage_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            top_k_endpoints: 10,
            find_endpoints_max_tokens: 1000,
            construct_request_max_tokens: 2000,
            cache_file: Some(PathBuf::from(DEFAULT_CACHE_FILE)),
            request_timeout_secs: 60,
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            voyage_api_key: None,
            voyage_base_url: "https://api.voyageai.com/v1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// `CACHE_FILE` set to an empty string, `disabled` or `none` turns the
    /// spec cache off.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let top_k_endpoints: usize = env::var("TOP_K_ENDPOINTS")
            .unwrap_or_else(|_| defaults.top_k_endpoints.to_string())
            .parse()?;
        anyhow::ensure!(top_k_endpoints > 0, "TOP_K_ENDPOINTS must be at least 1");

        let cache_file = match env::var("CACHE_FILE") {
            Ok(value) => parse_cache_file(&value),
            Err(_) => defaults.cache_file,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()?,
            shutdown_timeout_secs: env::var("SHUTDOWN_TIMEOUT")
                .unwrap_or_else(|_| defaults.shutdown_timeout_secs.to_string())
                .parse()?,
            model_name: env::var("MODEL_NAME").unwrap_or(defaults.model_name),
            embedding_model: env::var("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            top_k_endpoints,
            find_endpoints_max_tokens: env::var("FIND_ENDPOINTS_MAX_TOKENS")
                .unwrap_or_else(|_| defaults.find_endpoints_max_tokens.to_string())
                .parse()?,
            construct_request_max_tokens: env::var("CONSTRUCT_REQUEST_MAX_TOKENS")
                .unwrap_or_else(|_| defaults.construct_request_max_tokens.to_string())
                .parse()?,
            cache_file,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| defaults.request_timeout_secs.to_string())
                .parse()?,
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            voyage_api_key: env::var("VOYAGE_API_KEY").ok(),
            voyage_base_url: env::var("VOYAGE_BASE_URL").unwrap_or(defaults.voyage_base_url),
        })
    }
}

/// Interpret a cache file setting; the sentinel values disable caching.
pub fn parse_cache_file(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    match trimmed.to_lowercase().as_str() {
        "" | "disabled" | "none" | "off" => None,
        _ => Some(PathBuf::from(trimmed)),
    }
}
