use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::provider::CompletionClient;
use super::types::{ChatCompletionResponse, ChatMessage, ChatRequest};
use crate::core::config::CompletionConfig;
use crate::core::errors::RagError;

const ERROR_BODY_PREVIEW: usize = 200;

/// Client for an OpenAI-style `/v1/chat/completions` endpoint (Mistral by default).
#[derive(Clone)]
pub struct ChatCompletionClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    config: CompletionConfig,
    client: Client,
}

impl ChatCompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, RagError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::config)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            timeout,
            config: config.clone(),
            client,
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, RagError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RagError::CompletionFailed(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))
            } else {
                RagError::completion(e)
            }
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(RagError::CompletionFailed(format!(
                "chat endpoint returned {}: {}",
                status, preview
            )));
        }

        let payload: ChatCompletionResponse = res.json().await.map_err(RagError::completion)?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RagError::completion("response has no message content"))?;

        let answer = content.trim();
        if answer.is_empty() {
            return Err(RagError::completion("model returned an empty answer"));
        }

        Ok(answer.to_string())
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    fn name(&self) -> &str {
        "chat_completions"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_config(&self.config);
        self.chat(request).await
    }
}
