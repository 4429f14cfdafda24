//! Client for the AI service (Claude Messages API with tool use).

use async_trait::async_trait;
use thiserror::Error;

mod anthropic;
mod types;

pub use anthropic::AnthropicClient;
pub use types::{
    ContentBlock, Message, MessageContent, MessagesRequest, MessagesResponse, Role, StopReason,
    ToolDefinition, Usage,
};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// One request/response exchange with the model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse, LlmError>;
}
