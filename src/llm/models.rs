use crate::llm::usage::LlmUsage;
use serde::{Deserialize, Serialize};

/// Message role in LLM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Message in LLM conversation.
///
/// This is the wire format sent to the completion API. Messages are built fresh
/// every turn from persisted [`Turn`](crate::history::Turn) history and are never
/// stored themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LlmMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Response from an LLM gateway: the generated text plus whatever usage
/// counters the provider attached, if any.
#[derive(Debug, Clone)]
pub struct LlmGatewayResponse {
    pub content: String,
    pub usage: Option<LlmUsage>,
}
