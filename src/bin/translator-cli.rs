//! Command-line access to the spec cache and the translation pipeline.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use http_translator::{config::parse_cache_file, AppState, CacheAddOutcome, Config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "translator-cli")]
#[command(about = "Manage the OpenAPI spec cache and translate requests from the shell")]
struct Cli {
    /// Cache file to use instead of CACHE_FILE ("disabled" turns caching off)
    #[arg(long, global = true)]
    cache_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, embed and cache an OpenAPI spec
    AddCache {
        /// URL of the OpenAPI spec (JSON)
        api_spec_url: String,
    },
    /// List cached specs
    ListCache,
    /// Translate a request into an HTTP call and print it as JSON
    Translate {
        /// URL of the OpenAPI spec (JSON)
        #[arg(long)]
        api_spec_url: String,
        /// Skip the spec cache for this run
        #[arg(long, default_value_t = false)]
        no_cache: bool,
        /// What you want done, in plain language
        user_query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "http_translator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(cache_file) = &cli.cache_file {
        config.cache_file = parse_cache_file(cache_file);
    }
    let cache_path: Option<PathBuf> = config.cache_file.clone();

    let state = AppState::new(config)?;

    match cli.command {
        Commands::AddCache { api_spec_url } => {
            let Some(cache) = state.cache_store() else {
                bail!("cache is disabled; pass --cache-file <path>");
            };
            tracing::info!(
                url = %api_spec_url,
                cache = ?cache_path,
                model = %state.config.embedding_model,
                "Adding URL to spec cache"
            );

            match state.translator.add_url_to_cache(&api_spec_url, cache).await? {
                CacheAddOutcome::Added { endpoints } => {
                    let size = tokio::fs::metadata(cache.path()).await?.len();
                    println!(
                        "Cached {} ({} endpoints) in {} [{:.2} MB, {} URLs]",
                        api_spec_url,
                        endpoints,
                        cache.path().display(),
                        size as f64 / 1024.0 / 1024.0,
                        cache.len().await?
                    );
                }
                CacheAddOutcome::AlreadyCached => {
                    println!("{} is already cached, skipping", api_spec_url);
                }
            }
        }
        Commands::ListCache => {
            let Some(cache) = state.cache_store() else {
                bail!("cache is disabled; pass --cache-file <path>");
            };
            for summary in cache.summaries().await? {
                println!(
                    "{}\t{}\t{} endpoints\t{} dims",
                    summary.url, summary.model, summary.endpoints, summary.embedding_dim
                );
            }
        }
        Commands::Translate {
            api_spec_url,
            no_cache,
            user_query,
        } => {
            let cache = if no_cache { None } else { state.cache_store() };
            let translation = state
                .translator
                .translate(&user_query, &api_spec_url, cache)
                .await?;

            println!("{}", serde_json::to_string_pretty(&translation.http_request)?);
            if translation.http_request.is_failure() {
                bail!("model response could not be parsed into an HTTP request");
            }
        }
    }

    Ok(())
}
