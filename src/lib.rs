//! Retrieval-augmented question answering over a fixed, pre-built corpus.
//!
//! A question is embedded, matched against a FAISS flat index, and sent to a
//! chat-completion endpoint together with the closest passages. Any failure
//! along the way degrades to a context-free answer or a fixed fallback message.

pub mod core;
pub mod llm;
pub mod rag;
pub mod responder;
pub mod state;

pub use crate::core::config::{AppPaths, ConfigService, ResponderConfig};
pub use crate::core::errors::RagError;
pub use crate::llm::{ChatCompletionClient, CompletionClient};
pub use crate::rag::{Corpus, Embedder, Passage, Prompt, PromptAssembler, Retriever};
pub use crate::responder::{Outcome, Responder, Response, UngroundedReason};
pub use crate::state::{AppState, StartupOptions};
