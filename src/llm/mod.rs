pub mod chat_completions;
pub mod provider;
pub mod types;


pub use chat_completions::ChatCompletionClient;
pub use provider::CompletionClient;
pub use types::{ChatMessage, ChatRequest};
