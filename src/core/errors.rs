use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Embedding model, vector index or document store could not be loaded.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("id {id} is outside the document store (len {len})")]
    IndexOutOfRange { id: i64, len: usize },
    #[error("embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("completion failed: {0}")]
    CompletionFailed(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RagError {
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        RagError::ResourceUnavailable(err.to_string())
    }

    pub fn completion<E: std::fmt::Display>(err: E) -> Self {
        RagError::CompletionFailed(err.to_string())
    }

    pub fn config<E: std::fmt::Display>(err: E) -> Self {
        RagError::Config(err.to_string())
    }

    /// Whether the error only disables retrieval for the current request.
    pub fn disables_retrieval(&self) -> bool {
        matches!(
            self,
            RagError::ResourceUnavailable(_) | RagError::DimensionMismatch { .. }
        )
    }
}
