//! End-to-end translation of a natural-language request into one HTTP request.
//!
//! # Stages
//! `Start -> SpecAcquired -> EmbeddingsReady -> CandidatesRanked ->
//! EndpointsSelected -> RequestConstructed`
//!
//! Each stage consumes the previous stage's output, so they run strictly in
//! sequence. A missing precondition (no URL, no spec body, no ranked
//! candidates, no selected endpoints) stops the run with `InputMissing`;
//! nothing is retried.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::inference::{Embedder, InputType, LanguageModel, SpecFetcher};
use crate::ingestion::{extract_endpoint_documents, EndpointDocument};
use crate::persistence::{CacheEntry, CacheStore};
use crate::retrieval::{rank_query, EndpointScore, RagResult};
use crate::selection::{
    construct_http_request, find_relevant_endpoints, HttpRequestOutcome, SelectedEndpoint,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Pipeline progress, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    Start,
    SpecAcquired,
    EmbeddingsReady,
    CandidatesRanked,
    EndpointsSelected,
    RequestConstructed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SpecAcquired => "spec_acquired",
            Self::EmbeddingsReady => "embeddings_ready",
            Self::CandidatesRanked => "candidates_ranked",
            Self::EndpointsSelected => "endpoints_selected",
            Self::RequestConstructed => "request_constructed",
        }
    }
}

/// Where a piece of pipeline input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Fresh,
}

/// Tunables of a translation run.
#[derive(Debug, Clone)]
pub struct TranslatorSettings {
    pub embedding_model: String,
    pub top_k_endpoints: usize,
    pub find_endpoints_max_tokens: u32,
    pub construct_request_max_tokens: u32,
}

impl From<&Config> for TranslatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            embedding_model: config.embedding_model.clone(),
            top_k_endpoints: config.top_k_endpoints,
            find_endpoints_max_tokens: config.find_endpoints_max_tokens,
            construct_request_max_tokens: config.construct_request_max_tokens,
        }
    }
}

/// Result of a completed run, with the intermediate selections for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub http_request: HttpRequestOutcome,
    pub relevant_endpoints: Vec<SelectedEndpoint>,
    /// Top-K candidates handed to the narrowing step
    pub rag_results: Vec<RagResult>,
    /// Every endpoint with its score, best first
    pub all_rag_scores: Vec<EndpointScore>,
    pub spec_source: Source,
    pub embeddings_source: Source,
}

/// Outcome of [`Translator::add_url_to_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheAddOutcome {
    Added { endpoints: usize },
    AlreadyCached,
}

/// A spec with documents and document embeddings ready for ranking.
struct PreparedSpec {
    entry: Arc<CacheEntry>,
    spec_source: Source,
    embeddings_source: Source,
}

/// Runs the translation pipeline against its collaborators.
pub struct Translator {
    fetcher: Arc<dyn SpecFetcher>,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
    settings: TranslatorSettings,
}

impl Translator {
    pub fn new(
        fetcher: Arc<dyn SpecFetcher>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LanguageModel>,
        settings: TranslatorSettings,
    ) -> Self {
        Self {
            fetcher,
            embedder,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &TranslatorSettings {
        &self.settings
    }

    /// Translate `user_query` into a request against the API at `api_spec_url`.
    ///
    /// With `cache` set, a cached spec and its embeddings are reused and a
    /// freshly processed spec is added. `None` disables caching for this run.
    pub async fn translate(
        &self,
        user_query: &str,
        api_spec_url: &str,
        cache: Option<&CacheStore>,
    ) -> Result<Translation> {
        let start = Instant::now();
        let mut stage = PipelineStage::Start;

        let result = self
            .run(user_query, api_spec_url, cache, &mut stage)
            .await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        metrics::counter!("translate_requests_total").increment(1);
        metrics::histogram!("translate_latency_ms").record(elapsed_ms as f64);

        match &result {
            Ok(translation) => {
                tracing::info!(
                    url = api_spec_url,
                    elapsed_ms,
                    parse_failed = translation.http_request.is_failure(),
                    "Translation completed"
                );
            }
            Err(e) => {
                metrics::counter!("translate_failures_total", "stage" => stage.as_str())
                    .increment(1);
                tracing::warn!(
                    url = api_spec_url,
                    last_stage = stage.as_str(),
                    error = %e,
                    elapsed_ms,
                    "Translation failed"
                );
            }
        }

        result
    }

    async fn run(
        &self,
        user_query: &str,
        api_spec_url: &str,
        cache: Option<&CacheStore>,
        stage: &mut PipelineStage,
    ) -> Result<Translation> {
        if api_spec_url.trim().is_empty() {
            return Err(AppError::InputMissing(
                "API spec URL must be provided".to_string(),
            ));
        }
        if user_query.trim().is_empty() {
            return Err(AppError::ValidationError(
                "User query cannot be empty".to_string(),
            ));
        }

        let prepared = self.prepare(api_spec_url, cache, stage).await?;
        let entry = &prepared.entry;
        *stage = PipelineStage::EmbeddingsReady;

        let ranked = rank_query(
            self.embedder.as_ref(),
            &self.settings.embedding_model,
            user_query,
            &entry.endpoint_documents,
            &entry.embeddings,
        )
        .await?;
        let rag_results = ranked.top_k(self.settings.top_k_endpoints);
        let all_rag_scores = ranked.all_scores();
        *stage = PipelineStage::CandidatesRanked;

        tracing::info!(
            ranked = all_rag_scores.len(),
            candidates = rag_results.len(),
            "Endpoints ranked"
        );

        let relevant_endpoints = find_relevant_endpoints(
            self.llm.as_ref(),
            user_query,
            &rag_results,
            self.settings.find_endpoints_max_tokens,
        )
        .await?;
        *stage = PipelineStage::EndpointsSelected;

        let http_request = construct_http_request(
            self.llm.as_ref(),
            user_query,
            &entry.api_spec,
            &relevant_endpoints,
            self.settings.construct_request_max_tokens,
        )
        .await?;
        *stage = PipelineStage::RequestConstructed;

        Ok(Translation {
            http_request,
            relevant_endpoints,
            rag_results,
            all_rag_scores,
            spec_source: prepared.spec_source,
            embeddings_source: prepared.embeddings_source,
        })
    }

    /// Acquire the spec, documents and document embeddings, from cache or fresh.
    async fn prepare(
        &self,
        url: &str,
        cache: Option<&CacheStore>,
        stage: &mut PipelineStage,
    ) -> Result<PreparedSpec> {
        let cached = match cache {
            Some(store) => {
                tracing::info!(cache = %store.path().display(), "Checking for cached API spec");
                store.get(url).await?
            }
            None => None,
        };

        let Some(entry) = cached else {
            metrics::counter!("spec_cache_misses_total").increment(1);
            let api_spec = self.download_spec(url).await?;
            *stage = PipelineStage::SpecAcquired;

            let entry = Arc::new(self.embed_spec(api_spec).await?);

            if let Some(store) = cache {
                // a failed write only costs the next run a recomputation
                if let Err(e) = store.put_if_absent(url, Arc::clone(&entry)).await {
                    tracing::warn!(url, error = %e, "Could not add spec to cache");
                }
            }

            return Ok(PreparedSpec {
                entry,
                spec_source: Source::Fresh,
                embeddings_source: Source::Fresh,
            });
        };

        metrics::counter!("spec_cache_hits_total").increment(1);
        tracing::info!(url, "Using cached API spec");
        *stage = PipelineStage::SpecAcquired;

        if entry.model == self.settings.embedding_model {
            tracing::info!(url, endpoints = entry.endpoint_documents.len(), "Using cached embeddings");
            return Ok(PreparedSpec {
                entry,
                spec_source: Source::Cache,
                embeddings_source: Source::Cache,
            });
        }

        tracing::warn!(
            url,
            cached_model = %entry.model,
            configured_model = %self.settings.embedding_model,
            "Cached embeddings come from another model, re-embedding for this run"
        );
        let fresh = self.embed_spec(entry.api_spec.clone()).await?;

        Ok(PreparedSpec {
            entry: Arc::new(fresh),
            spec_source: Source::Cache,
            embeddings_source: Source::Fresh,
        })
    }

    /// Download `url` and add it to `cache` unless it is already there.
    ///
    /// Calling this twice for the same URL downloads and embeds only once.
    pub async fn add_url_to_cache(&self, url: &str, cache: &CacheStore) -> Result<CacheAddOutcome> {
        if url.trim().is_empty() {
            return Err(AppError::InputMissing(
                "API spec URL must be provided".to_string(),
            ));
        }

        tracing::info!(url, "Processing API spec");

        if cache.contains(url).await? {
            tracing::info!(url, "URL already in cache, skipping");
            return Ok(CacheAddOutcome::AlreadyCached);
        }

        let api_spec = self.download_spec(url).await?;
        let entry = self.embed_spec(api_spec).await?;
        let endpoints = entry.endpoint_documents.len();

        if !cache.put_if_absent(url, entry).await? {
            return Ok(CacheAddOutcome::AlreadyCached);
        }

        let urls_cached = cache.len().await?;
        tracing::info!(
            url,
            endpoints,
            cache = %cache.path().display(),
            urls_cached,
            "Cache updated"
        );

        Ok(CacheAddOutcome::Added { endpoints })
    }

    async fn download_spec(&self, url: &str) -> Result<serde_json::Value> {
        tracing::info!(url, "Downloading API spec");
        let api_spec = self.fetcher.fetch(url).await?;

        if !api_spec.is_object() {
            return Err(AppError::InputMissing(format!(
                "API spec body at {} is not a JSON object",
                url
            )));
        }

        Ok(api_spec)
    }

    /// Extract endpoint documents and embed them in one batched call.
    async fn embed_spec(&self, api_spec: serde_json::Value) -> Result<CacheEntry> {
        let documents: Vec<EndpointDocument> = extract_endpoint_documents(&api_spec);
        tracing::info!(endpoints = documents.len(), "Endpoints extracted");

        let embeddings = if documents.is_empty() {
            Vec::new()
        } else {
            tracing::info!(model = %self.settings.embedding_model, "Creating embeddings");
            let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
            self.embedder
                .embed(&texts, &self.settings.embedding_model, InputType::Document)
                .await?
        };

        CacheEntry::new(
            api_spec,
            documents,
            embeddings,
            self.settings.embedding_model.clone(),
        )
    }
}
