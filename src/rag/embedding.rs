//! Embedding provider.
//!
//! Query text is turned into a dense vector with a local sentence-embedding
//! model (fastembed / ONNX Runtime). The model is loaded at most once per
//! provider: concurrent first callers block on the same initialization and a
//! failed load is remembered instead of being retried on every request.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::core::errors::RagError;

/// Model names accepted in `embedding.model`.
pub const SUPPORTED_MODELS: [&str; 6] = [
    "all-MiniLM-L6-v2",
    "all-MiniLM-L12-v2",
    "bge-small-en-v1.5",
    "bge-base-en-v1.5",
    "paraphrase-multilingual-MiniLM-L12-v2",
    "multilingual-e5-small",
];

/// Text to vector encoder shared by every request.
pub trait Embedder: Send + Sync {
    /// Encode one text. Must accept empty and very short input.
    fn encode(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// A loaded model able to embed a single text.
pub trait EmbeddingModelHandle: Send + Sync {
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, String>;
}

impl EmbeddingModelHandle for TextEmbedding {
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, String> {
        self.embed(vec![text], None)
            .map_err(|e| e.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| "No embedding returned".to_string())
    }
}

type Loader<M> = Box<dyn Fn() -> Result<M, String> + Send + Sync>;

fn parse_model_name(name: &str) -> Option<EmbeddingModel> {
    let model = match name {
        "all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "all-MiniLM-L12-v2" => EmbeddingModel::AllMiniLML12V2,
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "paraphrase-multilingual-MiniLM-L12-v2" => EmbeddingModel::ParaphraseMLMiniLML12V2,
        "multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        _ => return None,
    };
    Some(model)
}

fn load_fastembed(
    model_name: &str,
    model: &EmbeddingModel,
    cache_dir: &Path,
) -> Result<TextEmbedding, String> {
    tracing::info!(
        "Loading embedding model {} (cache: {})",
        model_name,
        cache_dir.display()
    );

    let mut options = InitOptions::default();
    options.model_name = model.clone();
    options.cache_dir = cache_dir.to_path_buf();
    options.show_download_progress = false;

    match TextEmbedding::try_new(options) {
        Ok(model) => {
            tracing::info!("Embedding model {} loaded", model_name);
            Ok(model)
        }
        Err(e) => {
            tracing::error!("Failed to load embedding model {}: {}", model_name, e);
            Err(format!("embedding model {}: {}", model_name, e))
        }
    }
}

pub struct FastEmbedProvider<M = TextEmbedding> {
    model_name: String,
    loader: Loader<M>,
    loaded: OnceLock<Result<M, String>>,
}

impl FastEmbedProvider<TextEmbedding> {
    /// Create the provider without loading the model.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, RagError> {
        let model = parse_model_name(model_name).ok_or_else(|| {
            RagError::Config(format!("unsupported embedding model '{}'", model_name))
        })?;

        let name = model_name.to_string();
        Ok(Self::with_loader(model_name, move || {
            load_fastembed(&name, &model, &cache_dir)
        }))
    }
}

impl<M: EmbeddingModelHandle> FastEmbedProvider<M> {
    /// Provider whose model comes from `loader`, called at most once.
    pub fn with_loader<F>(model_name: &str, loader: F) -> Self
    where
        F: Fn() -> Result<M, String> + Send + Sync + 'static,
    {
        Self {
            model_name: model_name.to_string(),
            loader: Box::new(loader),
            loaded: OnceLock::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.loaded.get(), Some(Ok(_)))
    }

    /// Load the model now instead of on the first query.
    pub fn warm_up(&self) -> Result<(), RagError> {
        self.model().map(|_| ())
    }

    fn model(&self) -> Result<&M, RagError> {
        self.loaded
            .get_or_init(|| (self.loader)())
            .as_ref()
            .map_err(|reason| RagError::ResourceUnavailable(reason.clone()))
    }
}

impl<M: EmbeddingModelHandle> Embedder for FastEmbedProvider<M> {
    fn encode(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.model()?
            .embed_one(text)
            .map_err(RagError::ResourceUnavailable)
    }
}
