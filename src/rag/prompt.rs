//! Prompt assembly.
//!
//! The system message is fixed when the assembler is built; query text only
//! ever lands in the user message. With no passages the user message is the
//! bare query and the persona stays in place.

use crate::llm::types::ChatMessage;

const CONTEXT_INSTRUCTION: &str = "Answer strictly from the following data. \
If the data contains exact figures, give them exactly. \
Do not speculate beyond what the data says.";
const CONTEXT_HEADER: &str = "### Data";
const QUESTION_HEADER: &str = "### Question";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// `[system, user]` message pair for the chat endpoint.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_prompt: String,
}

impl PromptAssembler {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn assemble<P: AsRef<str>>(&self, query: &str, passages: &[P]) -> Prompt {
        let user = if passages.is_empty() {
            query.to_string()
        } else {
            let context = passages
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{CONTEXT_INSTRUCTION}\n\n{CONTEXT_HEADER}\n{context}\n\n{QUESTION_HEADER}\n{query}"
            )
        };

        Prompt {
            system: self.system_prompt.clone(),
            user,
        }
    }
}
