//! Retriever: embedding provider + vector index + document store.

use std::sync::Arc;

use serde::Serialize;

use super::corpus::Corpus;
use super::embedding::Embedder;
use crate::core::errors::RagError;

/// A retrieved passage with its rank distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    pub id: i64,
    pub text: String,
    pub distance: f32,
}

impl AsRef<str> for Passage {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    corpus: Option<Arc<Corpus>>,
}

impl Retriever {
    /// `corpus` is `None` when the artifacts failed to load; retrieval is then disabled.
    pub fn new(embedder: Arc<dyn Embedder>, corpus: Option<Arc<Corpus>>) -> Self {
        Self { embedder, corpus }
    }

    pub fn is_enabled(&self) -> bool {
        self.corpus.is_some()
    }

    pub fn corpus(&self) -> Option<&Corpus> {
        self.corpus.as_deref()
    }

    /// Up to `k` passages closest to `query`, closest first.
    ///
    /// Errors only when retrieval as a whole is unavailable for this request
    /// (no corpus, embedding failure, dimension mismatch). Neighbor ids without
    /// a passage are skipped.
    pub fn try_retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, RagError> {
        let corpus = self
            .corpus
            .as_deref()
            .ok_or_else(|| RagError::unavailable("corpus is not loaded"))?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.encode(query)?;
        let hits = corpus.index().search(&embedding, k)?;

        let passages: Vec<Passage> = hits
            .ids
            .iter()
            .zip(hits.distances.iter())
            .filter_map(|(&id, &distance)| match corpus.documents().get(id) {
                Ok(text) => Some(Passage {
                    id,
                    text: text.to_string(),
                    distance,
                }),
                Err(err) => {
                    tracing::warn!("Skipping neighbor: {}", err);
                    None
                }
            })
            .take(k)
            .collect();

        tracing::debug!(
            "Retrieved {} passage(s) for k={} ({} neighbor(s) searched)",
            passages.len(),
            k,
            hits.len()
        );

        Ok(passages)
    }

    /// Like [`try_retrieve`](Self::try_retrieve) but never fails: unavailable
    /// retrieval yields an empty list.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<Passage> {
        match self.try_retrieve(query, k) {
            Ok(passages) => passages,
            Err(err) => {
                tracing::warn!("Retrieval disabled for this query: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::documents::DocumentStore;
    use crate::rag::index::{Metric, VectorIndex};
    use crate::rag::test_support::{BrokenEmbedder, KeywordEmbedder};

    const KEYWORDS: &[&str] = &["vitamin", "iron", "calcium"];

    fn keywords() -> Arc<KeywordEmbedder> {
        Arc::new(KeywordEmbedder::new(KEYWORDS))
    }

    fn corpus(passages: &[&str], vectors: Vec<f32>) -> Arc<Corpus> {
        let index = VectorIndex::from_vectors(Metric::L2, 3, vectors).expect("index");
        let documents = DocumentStore::new(passages.iter().map(|p| p.to_string()).collect());
        Arc::new(Corpus::new(index, documents))
    }

    fn nutrition_corpus() -> Arc<Corpus> {
        corpus(
            &["Vitamin C: 90mg/day", "Iron: 8mg/day", "Calcium: 1000mg/day"],
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        )
    }

    #[test]
    fn single_passage_corpus_returns_that_passage() {
        let retriever = Retriever::new(
            keywords(),
            Some(corpus(&["Vitamin C: 90mg/day"], vec![1.0, 0.0, 0.0])),
        );

        let passages = retriever.retrieve("how much vitamin C", 1);
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Vitamin C: 90mg/day");
        assert_eq!(passages[0].id, 0);
    }

    #[test]
    fn results_are_ranked_and_capped_at_k() {
        let retriever = Retriever::new(keywords(), Some(nutrition_corpus()));

        let passages = retriever.retrieve("iron intake", 2);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].text, "Iron: 8mg/day");
        assert!(passages[0].distance <= passages[1].distance);
    }

    #[test]
    fn k_beyond_corpus_size_returns_every_passage() {
        let retriever = Retriever::new(keywords(), Some(nutrition_corpus()));
        assert_eq!(retriever.retrieve("calcium", 10).len(), 3);
        assert!(retriever.retrieve("calcium", 0).is_empty());
    }

    #[test]
    fn ids_without_passages_are_skipped() {
        // four vectors, two passages: ids 2 and 3 have no text
        let retriever = Retriever::new(
            keywords(),
            Some(corpus(
                &["Vitamin C: 90mg/day", "Iron: 8mg/day"],
                vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.9, 0.0, 0.0],
            )),
        );

        let passages = retriever.retrieve("vitamin", 4);
        let ids: Vec<i64> = passages.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert!(passages.iter().all(|p| !p.text.is_empty()));
    }

    #[test]
    fn missing_corpus_disables_retrieval() {
        let retriever = Retriever::new(keywords(), None);

        assert!(!retriever.is_enabled());
        assert!(retriever.retrieve("vitamin", 3).is_empty());
        assert!(matches!(
            retriever.try_retrieve("vitamin", 3),
            Err(RagError::ResourceUnavailable(_))
        ));
    }

    #[test]
    fn embedding_failure_yields_empty_result() {
        let retriever = Retriever::new(Arc::new(BrokenEmbedder), Some(nutrition_corpus()));
        assert!(retriever.retrieve("vitamin", 3).is_empty());
        assert!(retriever.try_retrieve("vitamin", 3).is_err());
    }

    #[test]
    fn retrieval_is_repeatable() {
        let retriever = Retriever::new(keywords(), Some(nutrition_corpus()));
        assert_eq!(
            retriever.retrieve("calcium and iron", 3),
            retriever.retrieve("calcium and iron", 3)
        );
    }

    #[test]
    fn empty_query_does_not_fail() {
        let retriever = Retriever::new(keywords(), Some(nutrition_corpus()));
        assert_eq!(retriever.retrieve("", 2).len(), 2);
    }
}
