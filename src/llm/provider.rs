use async_trait::async_trait;

use crate::core::errors::RagError;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// provider name for logs (e.g. "mistral")
    fn name(&self) -> &str;

    /// one non-streaming chat completion with a system and a user message.
    /// Any transport, status or payload problem is `RagError::CompletionFailed`.
    async fn complete(&self, system: &str, user: &str) -> Result<String, RagError>;
}
