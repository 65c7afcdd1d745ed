//! Chat-completion backend abstraction
//!
//! The recommendation flow only needs one capability from a language model:
//! turn a list of chat messages into a single text completion. Concrete
//! backends live in submodules.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub mod openai;

pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Wire body of a chat-completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub n: u32,
}

/// Trait for completion backends
///
/// Implementations make exactly one attempt per call. A non-success status,
/// a transport failure or a response without any choice is an
/// `AppError::ExternalApi`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the text content of the first choice
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
