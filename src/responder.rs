//! RAG orchestrator.
//!
//! One request runs `retrieve -> assemble -> complete` in order:
//! - passages found: the prompt carries them as context
//! - no passages, or retrieval unavailable: the bare query is sent
//! - completion failed (after optional retries): the fixed fallback message
//!
//! Every branch ends in a string; no error leaves [`Responder::respond`].

use std::sync::Arc;

use serde::Serialize;

use crate::core::config::AnswerPolicy;
use crate::core::errors::RagError;
use crate::llm::CompletionClient;
use crate::rag::{Passage, Prompt, PromptAssembler, Retriever};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UngroundedReason {
    NoRelevantContext,
    RetrievalUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Grounded { passages: Vec<Passage> },
    Ungrounded { reason: UngroundedReason },
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub text: String,
    pub outcome: Outcome,
}

pub struct Responder {
    retriever: Arc<Retriever>,
    assembler: PromptAssembler,
    completion: Arc<dyn CompletionClient>,
    top_k: usize,
    fallback_message: String,
    max_retries: u32,
}

impl Responder {
    pub fn new(
        retriever: Arc<Retriever>,
        completion: Arc<dyn CompletionClient>,
        policy: &AnswerPolicy,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::new(policy.system_prompt.clone()),
            completion,
            top_k,
            fallback_message: policy.fallback_message.clone(),
            max_retries: policy.max_retries,
        }
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    /// Answer text only.
    pub async fn answer(&self, query: &str) -> String {
        self.respond(query).await.text
    }

    pub async fn respond(&self, query: &str) -> Response {
        let (prompt, grounding) = match self.gather_context(query).await {
            Ok(passages) if !passages.is_empty() => {
                tracing::info!("Answering with {} retrieved passage(s)", passages.len());
                let prompt = self.assembler.assemble(query, &passages);
                (prompt, Outcome::Grounded { passages })
            }
            Ok(_) => {
                tracing::info!("No relevant context found, answering without context");
                (
                    self.assembler.assemble::<Passage>(query, &[]),
                    Outcome::Ungrounded {
                        reason: UngroundedReason::NoRelevantContext,
                    },
                )
            }
            Err(err) => {
                tracing::warn!("Retrieval unavailable ({}), answering without context", err);
                (
                    self.assembler.assemble::<Passage>(query, &[]),
                    Outcome::Ungrounded {
                        reason: UngroundedReason::RetrievalUnavailable,
                    },
                )
            }
        };

        match self.complete_with_retries(&prompt).await {
            Ok(text) => Response {
                text,
                outcome: grounding,
            },
            Err(err) => {
                tracing::error!("Completion failed, sending fallback message: {}", err);
                Response {
                    text: self.fallback_message.clone(),
                    outcome: Outcome::Fallback,
                }
            }
        }
    }

    async fn gather_context(&self, query: &str) -> Result<Vec<Passage>, RagError> {
        let retriever = self.retriever.clone();
        let query = query.to_string();
        let top_k = self.top_k;

        tokio::task::spawn_blocking(move || retriever.try_retrieve(&query, top_k))
            .await
            .map_err(|e| RagError::ResourceUnavailable(format!("retrieval task failed: {}", e)))?
    }

    async fn complete_with_retries(&self, prompt: &Prompt) -> Result<String, RagError> {
        let mut attempt = 0;
        loop {
            match self.completion.complete(&prompt.system, &prompt.user).await {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "{} completion attempt {} failed: {}; retrying",
                        self.completion.name(),
                        attempt,
                        err
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::rag::test_support::KeywordEmbedder;
    use crate::rag::{Corpus, DocumentStore, Metric, VectorIndex};

    const KEYWORDS: &[&str] = &["vitamin", "iron"];

    /// Replays scripted results and records every prompt it receives.
    struct ScriptedCompletion {
        script: Mutex<VecDeque<Result<String, RagError>>>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedCompletion {
        fn new(script: Vec<Result<String, RagError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, system: &str, user: &str) -> Result<String, RagError> {
            self.calls
                .lock()
                .expect("lock")
                .push((system.to_string(), user.to_string()));
            self.script
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Err(RagError::completion("script exhausted")))
        }
    }

    fn policy(max_retries: u32) -> AnswerPolicy {
        AnswerPolicy {
            system_prompt: "You are a nutrition assistant.".to_string(),
            fallback_message: "Sorry, please try again later.".to_string(),
            max_retries,
        }
    }

    fn retriever(with_corpus: bool) -> Arc<Retriever> {
        let corpus = with_corpus.then(|| {
            let index = VectorIndex::from_vectors(Metric::L2, 2, vec![1.0, 0.0]).expect("index");
            let documents = DocumentStore::new(vec!["Vitamin C: 90mg/day".to_string()]);
            Arc::new(Corpus::new(index, documents))
        });
        Arc::new(Retriever::new(Arc::new(KeywordEmbedder::new(KEYWORDS)), corpus))
    }

    fn responder(
        with_corpus: bool,
        completion: Arc<ScriptedCompletion>,
        max_retries: u32,
    ) -> Responder {
        Responder::new(retriever(with_corpus), completion, &policy(max_retries), 1)
    }

    #[tokio::test]
    async fn grounded_answer_carries_passage_and_query() {
        let completion = ScriptedCompletion::new(vec![Ok("90mg per day.".to_string())]);
        let responder = responder(true, completion.clone(), 0);

        let response = responder.respond("how much vitamin C").await;

        assert_eq!(response.text, "90mg per day.");
        assert!(matches!(
            response.outcome,
            Outcome::Grounded { ref passages } if passages.len() == 1
        ));

        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "You are a nutrition assistant.");
        assert!(calls[0].1.contains("Vitamin C: 90mg/day"));
        assert!(calls[0].1.contains("how much vitamin C"));
    }

    #[tokio::test]
    async fn missing_corpus_answers_without_context() {
        let completion = ScriptedCompletion::new(vec![Ok("General advice.".to_string())]);
        let responder = responder(false, completion.clone(), 0);

        let response = responder.respond("how much vitamin C").await;

        assert_eq!(response.text, "General advice.");
        assert_eq!(
            response.outcome,
            Outcome::Ungrounded {
                reason: UngroundedReason::RetrievalUnavailable
            }
        );
        assert_eq!(completion.calls()[0].1, "how much vitamin C");
    }

    #[tokio::test]
    async fn stale_corpus_without_passages_is_ungrounded() {
        let index = VectorIndex::from_vectors(Metric::L2, 2, vec![1.0, 0.0]).expect("index");
        let corpus = Arc::new(Corpus::new(index, DocumentStore::new(Vec::new())));
        let retriever = Arc::new(Retriever::new(
            Arc::new(KeywordEmbedder::new(KEYWORDS)),
            Some(corpus),
        ));
        let completion = ScriptedCompletion::new(vec![Ok("No data, but...".to_string())]);
        let responder = Responder::new(retriever, completion.clone(), &policy(0), 3);

        let response = responder.respond("vitamin").await;

        assert_eq!(
            response.outcome,
            Outcome::Ungrounded {
                reason: UngroundedReason::NoRelevantContext
            }
        );
        assert_eq!(completion.calls()[0].1, "vitamin");
    }

    #[tokio::test]
    async fn completion_failure_returns_fallback_verbatim() {
        let completion = ScriptedCompletion::new(vec![Err(RagError::completion("503"))]);
        let responder = responder(true, completion, 0);

        let response = responder.respond("how much vitamin C").await;

        assert_eq!(response.text, "Sorry, please try again later.");
        assert_eq!(response.outcome, Outcome::Fallback);
    }

    #[tokio::test]
    async fn fallback_when_retrieval_and_completion_both_fail() {
        let completion = ScriptedCompletion::new(vec![Err(RagError::completion("timeout"))]);
        let responder = responder(false, completion, 0);

        assert_eq!(
            responder.answer("anything").await,
            "Sorry, please try again later."
        );
    }

    #[tokio::test]
    async fn retries_stop_at_first_success() {
        let completion = ScriptedCompletion::new(vec![
            Err(RagError::completion("reset")),
            Ok("Recovered.".to_string()),
        ]);
        let responder = responder(true, completion.clone(), 2);

        assert_eq!(responder.answer("vitamin").await, "Recovered.");
        assert_eq!(completion.calls().len(), 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let completion = ScriptedCompletion::new(vec![
            Err(RagError::completion("1")),
            Err(RagError::completion("2")),
            Err(RagError::completion("3")),
            Ok("too late".to_string()),
        ]);
        let responder = responder(true, completion.clone(), 2);

        assert_eq!(
            responder.answer("vitamin").await,
            "Sorry, please try again later."
        );
        assert_eq!(completion.calls().len(), 3);
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let completion = ScriptedCompletion::new(vec![
            Err(RagError::completion("once")),
            Ok("unused".to_string()),
        ]);
        let responder = responder(true, completion.clone(), 0);

        assert_eq!(responder.answer("vitamin").await, responder.fallback_message());
        assert_eq!(completion.calls().len(), 1);
    }
}
