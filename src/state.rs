use crate::config::Config;
use crate::error::Result;
use crate::inference::{AnthropicModel, HttpSpecFetcher, VoyageEmbedder};
use crate::persistence::CacheStore;
use crate::pipeline::{Translator, TranslatorSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all request handlers.
pub struct AppState {
    pub translator: Arc<Translator>,
    /// `None` when caching is disabled by configuration.
    pub cache: Option<Arc<CacheStore>>,
    /// Flag indicating the service is ready (cache file loaded)
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state with the HTTP-backed collaborators described by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let fetcher = HttpSpecFetcher::new(timeout)?;
        let embedder =
            VoyageEmbedder::new(config.voyage_api_key.clone(), &config.voyage_base_url, timeout)?;
        let llm = AnthropicModel::new(
            config.anthropic_api_key.clone(),
            &config.anthropic_base_url,
            config.model_name.clone(),
            timeout,
        )?;

        if config.voyage_api_key.is_none() || config.anthropic_api_key.is_none() {
            tracing::warn!("VOYAGE_API_KEY or ANTHROPIC_API_KEY unset, translations will fail");
        }

        let translator = Translator::new(
            Arc::new(fetcher),
            Arc::new(embedder),
            Arc::new(llm),
            TranslatorSettings::from(&config),
        );

        Ok(Self::with_translator(config, translator))
    }

    /// Build state around an existing translator.
    pub fn with_translator(config: Config, translator: Translator) -> Self {
        let cache = config
            .cache_file
            .as_ref()
            .map(|path| Arc::new(CacheStore::open(path)));

        tracing::info!(
            cache = ?config.cache_file,
            model = %config.model_name,
            embedding_model = %config.embedding_model,
            top_k = config.top_k_endpoints,
            "Translator configured"
        );

        Self {
            translator: Arc::new(translator),
            cache,
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        }
    }

    /// Load the cache file up front so the first request does not pay for it,
    /// then mark the service ready.
    pub async fn warmup(&self) -> Result<()> {
        if let Some(cache) = &self.cache {
            let urls = cache.len().await?;
            tracing::info!(path = %cache.path().display(), urls, "Spec cache warmed up");
        }

        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn cache_store(&self) -> Option<&CacheStore> {
        self.cache.as_deref()
    }
}
