use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::defaults::MAX_TOP_K;
use crate::core::config::{AppPaths, ConfigService, ResponderConfig};
use crate::llm::{ChatCompletionClient, CompletionClient};
use crate::rag::{Corpus, Embedder, FastEmbedProvider, Retriever};
use crate::responder::Responder;

pub mod error;

use error::InitializationError;

/// Overrides coming from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<PathBuf>,
    pub top_k: Option<usize>,
}

/// Shared, read-only state built once before any question is answered.
///
/// Contains:
/// - Paths and the effective configuration
/// - The retriever (embedding provider + corpus, if it loaded)
/// - The responder wiring retrieval, prompt assembly and completion
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<ResponderConfig>,
    pub retriever: Arc<Retriever>,
    pub responder: Arc<Responder>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Loading and validating configuration
    /// 2. Loading the embedding model (a failure only disables retrieval)
    /// 3. Loading the corpus artifacts (a failure only disables retrieval)
    /// 4. Building the completion client and the responder
    pub async fn initialize(
        paths: Arc<AppPaths>,
        options: StartupOptions,
    ) -> Result<Arc<Self>, InitializationError> {
        let mut service = ConfigService::new(paths.clone());
        if let Some(path) = options.config_path.clone() {
            service = service.with_config_path(path);
        }

        let mut config = service
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;
        if let Some(top_k) = options.top_k {
            config.retrieval.top_k = clamp_top_k(top_k);
        }

        match serde_json::to_value(&config) {
            Ok(value) => tracing::debug!(
                "Effective configuration: {}",
                service.redact_sensitive_values(&value)
            ),
            Err(e) => tracing::debug!("Could not render configuration: {}", e),
        }

        let cache_dir = config
            .embedding
            .cache_dir
            .as_deref()
            .map(|dir| paths.resolve(dir))
            .unwrap_or_else(|| paths.model_cache_dir.clone());
        let provider = Arc::new(
            FastEmbedProvider::new(&config.embedding.model, cache_dir)
                .map_err(|e| InitializationError::Embedding(e.into()))?,
        );

        let warm = provider.clone();
        match tokio::task::spawn_blocking(move || warm.warm_up()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Embedding model unavailable, retrieval disabled: {}", e),
            Err(e) => tracing::warn!("Embedding model initialization task panicked: {}", e),
        }

        Self::from_parts(paths, config, provider)
    }

    /// Build the state around an already constructed embedder.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ResponderConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Arc<Self>, InitializationError> {
        let index_path = paths.resolve(&config.corpus.index_path);
        let documents_path = paths.resolve(&config.corpus.documents_path);
        let corpus = match Corpus::load(&index_path, &documents_path) {
            Ok(corpus) => Some(Arc::new(corpus)),
            Err(e) => {
                tracing::warn!("Corpus unavailable, answering without retrieval: {}", e);
                None
            }
        };
        let retriever = Arc::new(Retriever::new(embedder, corpus));

        if config.completion.api_key.is_none() {
            tracing::warn!("No completion API key configured; requests may be rejected");
        }
        let completion: Arc<dyn CompletionClient> = Arc::new(
            ChatCompletionClient::new(&config.completion)
                .map_err(|e| InitializationError::Completion(e.into()))?,
        );

        let responder = Arc::new(Responder::new(
            retriever.clone(),
            completion,
            &config.responder,
            config.retrieval.top_k,
        ));

        Ok(Arc::new(AppState {
            paths,
            config: Arc::new(config),
            retriever,
            responder,
        }))
    }
}

/// Command-line `top_k` limited to the range accepted in the config file.
fn clamp_top_k(requested: usize) -> usize {
    let top_k = requested.clamp(1, MAX_TOP_K);
    if top_k != requested {
        tracing::warn!("top_k {} out of range, using {}", requested, top_k);
    }
    top_k
}
