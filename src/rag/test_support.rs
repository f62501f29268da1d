//! Embedders shared by the unit tests.

use super::embedding::Embedder;
use crate::core::errors::RagError;

/// One axis per keyword: 1.0 when the text mentions it, 0.0 otherwise.
pub(crate) struct KeywordEmbedder {
    keywords: &'static [&'static str],
}

impl KeywordEmbedder {
    pub(crate) fn new(keywords: &'static [&'static str]) -> Self {
        Self { keywords }
    }
}

impl Embedder for KeywordEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let text = text.to_lowercase();
        Ok(self
            .keywords
            .iter()
            .map(|word| if text.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }
}

pub(crate) struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn encode(&self, _text: &str) -> Result<Vec<f32>, RagError> {
        Err(RagError::unavailable("model files missing"))
    }
}
