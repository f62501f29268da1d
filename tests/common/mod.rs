#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rag_responder::{Embedder, RagError};

pub const VOCABULARY: [&str; 4] = ["vitamin", "iron", "calcium", "protein"];

/// One axis per vocabulary word; deterministic and model-free.
pub struct VocabularyEmbedder;

impl Embedder for VocabularyEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let text = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| if text.contains(word) { 1.0 } else { 0.0 })
            .collect())
    }
}

/// Write `vectors` as a FAISS `IndexFlatL2` file.
pub fn write_flat_l2(path: &Path, dimension: usize, vectors: &[f32]) {
    let mut out = Vec::new();
    out.extend_from_slice(b"IxF2");
    out.extend_from_slice(&(dimension as i32).to_le_bytes());
    out.extend_from_slice(&((vectors.len() / dimension) as i64).to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.push(1);
    out.extend_from_slice(&1i32.to_le_bytes());
    out.extend_from_slice(&(vectors.len() as u64).to_le_bytes());
    for value in vectors {
        out.extend_from_slice(&value.to_le_bytes());
    }
    fs::write(path, out).expect("write index");
}

pub fn write_documents(path: &Path, passages: &[&str]) {
    fs::write(path, serde_json::to_string(passages).expect("json")).expect("write documents");
}

/// Chat endpoint double: records request bodies, answers with a canned text
/// or a status code.
#[derive(Clone)]
pub struct MockChat {
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockChat {
    pub fn user_messages(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("lock")
            .iter()
            .map(|body| body["messages"][1]["content"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub async fn spawn_chat_server(answer: Option<&'static str>) -> (String, MockChat) {
    let mock = MockChat {
        requests: Arc::new(Mutex::new(Vec::new())),
    };
    let recorder = mock.clone();

    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let recorder = recorder.clone();
            async move {
                recorder.requests.lock().expect("lock").push(body);
                match answer {
                    Some(text) => (
                        StatusCode::OK,
                        Json(json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })),
                    ),
                    None => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "upstream exploded" })),
                    ),
                }
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    (format!("http://{}", addr), mock)
}
