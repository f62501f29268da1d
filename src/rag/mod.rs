//! Retrieval-augmented answering core.
//!
//! This module provides:
//! - `Embedder` / `FastEmbedProvider`: query text to vector
//! - `VectorIndex` + `DocumentStore` (paired as `Corpus`): the read-only artifacts
//! - `Retriever`: nearest passages for a query
//! - `PromptAssembler`: system/user message pair with the retrieved context

pub mod corpus;
pub mod documents;
pub mod embedding;
pub mod index;
pub mod prompt;
pub mod retriever;

#[cfg(test)]
pub(crate) mod test_support;

pub use corpus::Corpus;
pub use documents::DocumentStore;
pub use embedding::{Embedder, EmbeddingModelHandle, FastEmbedProvider};
pub use index::{Metric, SearchHits, VectorIndex};
pub use prompt::{Prompt, PromptAssembler};
pub use retriever::{Passage, Retriever};
