//! Chat model access
//!
//! The assistant talks to models through `ChatModel`; `WatsonxClient` is
//! the hosted implementation.

pub mod watsonx;

pub use watsonx::WatsonxClient;

use crate::memory::ConversationMessage;
use crate::response::ChatResponse;
use crate::Result;
use serde::Serialize;

/// One message of a chat completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

impl From<&ConversationMessage> for ChatTurn {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role.as_chat_role(),
            content: message.content.clone(),
        }
    }
}

/// A chat completion backend
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, turns: &[ChatTurn]) -> Result<ChatResponse>;
}
