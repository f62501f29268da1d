use std::path::Path;

use super::documents::DocumentStore;
use super::index::VectorIndex;
use crate::core::errors::RagError;

/// Immutable pair of vector index and aligned passages, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Corpus {
    index: VectorIndex,
    documents: DocumentStore,
}

impl Corpus {
    /// Pair an index with its passages. A count mismatch is logged, not rejected.
    pub fn new(index: VectorIndex, documents: DocumentStore) -> Self {
        if index.count() != documents.len() {
            tracing::warn!(
                "Corpus integrity: index holds {} vectors but document store holds {} passages; \
                 unmatched ids will be skipped",
                index.count(),
                documents.len()
            );
        }
        Self { index, documents }
    }

    pub fn load(index_path: &Path, documents_path: &Path) -> Result<Self, RagError> {
        let index = VectorIndex::load(index_path)?;
        let documents = DocumentStore::load(documents_path)?;

        tracing::info!(
            "Loaded corpus: {} vectors (dim {}, {:?}) from {}, {} passages from {}",
            index.count(),
            index.dimension(),
            index.metric(),
            index_path.display(),
            documents.len(),
            documents_path.display()
        );

        Ok(Self::new(index, documents))
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn is_consistent(&self) -> bool {
        self.index.count() == self.documents.len()
    }
}
