//! Claude Messages API request/response types.
//!
//! Assistant content is kept as the raw JSON the service returned so it can
//! be echoed back byte-for-byte; [`ContentBlock`] is the typed view used for
//! inspection.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// Message content: a plain string or a list of raw content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant_blocks(blocks: Vec<Value>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    pub fn user_blocks(blocks: Vec<Value>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// A tool offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolDefinition {
    /// Executed locally by the dispatcher.
    Custom {
        name: String,
        description: String,
        input_schema: Value,
    },
    /// Executed by the platform itself (e.g. the code-execution sandbox).
    Server {
        #[serde(rename = "type")]
        kind: String,
        name: String,
    },
}

impl ToolDefinition {
    /// The platform's sandboxed Python/bash execution capability.
    pub fn code_execution() -> Self {
        ToolDefinition::Server {
            kind: "code_execution_20250825".to_string(),
            name: "code_execution".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub tools: Vec<ToolDefinition>,
    pub messages: Vec<Message>,
    /// Code-execution container to reuse, if the service handed one out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Why a response ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    /// A long-running server tool paused the turn; resend to continue.
    PauseTurn,
    MaxTokens,
    StopSequence,
    Refusal,
    Other(String),
}

impl StopReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "pause_turn" => StopReason::PauseTurn,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "refusal" => StopReason::Refusal,
            other => StopReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StopReason::EndTurn => "end_turn",
            StopReason::ToolUse => "tool_use",
            StopReason::PauseTurn => "pause_turn",
            StopReason::MaxTokens => "max_tokens",
            StopReason::StopSequence => "stop_sequence",
            StopReason::Refusal => "refusal",
            StopReason::Other(s) => s,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view of one response content block.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Request for a locally executed tool; must be answered.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Activity of a platform tool; resolved by the service itself.
    ServerToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Any `tool_result` / `*_tool_result` block.
    ToolResult {
        block_type: String,
        tool_use_id: String,
        content: Value,
    },
    /// A block type this client does not know, kept whole for diagnostics.
    Unknown {
        block_type: String,
        raw: Value,
    },
}

impl ContentBlock {
    pub fn from_value(value: &Value) -> Result<Self, LlmError> {
        let block_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::MalformedResponse("content block without type".into()))?;

        let block = match block_type {
            "text" => ContentBlock::Text {
                text: required_str(value, block_type, "text")?,
            },
            "tool_use" => ContentBlock::ToolUse {
                id: required_str(value, block_type, "id")?,
                name: required_str(value, block_type, "name")?,
                input: value.get("input").cloned().unwrap_or_else(|| Value::Object(Default::default())),
            },
            "server_tool_use" => ContentBlock::ServerToolUse {
                id: required_str(value, block_type, "id")?,
                name: required_str(value, block_type, "name")?,
                input: value.get("input").cloned().unwrap_or(Value::Null),
            },
            t if t == "tool_result" || t.ends_with("_tool_result") => ContentBlock::ToolResult {
                block_type: t.to_string(),
                tool_use_id: required_str(value, block_type, "tool_use_id")?,
                content: value.get("content").cloned().unwrap_or(Value::Null),
            },
            other => ContentBlock::Unknown {
                block_type: other.to_string(),
                raw: value.clone(),
            },
        };
        Ok(block)
    }

    pub fn block_type(&self) -> &str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::ToolUse { .. } => "tool_use",
            ContentBlock::ServerToolUse { .. } => "server_tool_use",
            ContentBlock::ToolResult { block_type, .. } => block_type,
            ContentBlock::Unknown { block_type, .. } => block_type,
        }
    }
}

fn required_str(value: &Value, block_type: &str, field: &str) -> Result<String, LlmError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LlmError::MalformedResponse(format!("{block_type} block missing '{field}'"))
        })
}

/// A validated Messages API response.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagesResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub stop_reason: StopReason,
    pub usage: Option<Usage>,
    /// Code-execution container id, if the sandbox was used.
    pub container_id: Option<String>,
    /// Content exactly as returned.
    pub content: Vec<Value>,
    /// Typed view of `content`, same order.
    pub blocks: Vec<ContentBlock>,
}

impl MessagesResponse {
    /// Validate a decoded response body.
    ///
    /// `stop_reason` and `content` are required; every content block of a
    /// known type must carry its fields.
    pub fn from_value(body: Value) -> Result<Self, LlmError> {
        let stop_reason = body
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(StopReason::parse)
            .ok_or_else(|| LlmError::MalformedResponse("missing stop_reason".into()))?;

        let content = body
            .get("content")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| LlmError::MalformedResponse("missing content".into()))?;

        let blocks = content
            .iter()
            .map(ContentBlock::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let usage = match body.get("usage") {
            Some(u) if !u.is_null() => Some(serde_json::from_value::<Usage>(u.clone())?),
            _ => None,
        };

        Ok(Self {
            id: body.get("id").and_then(Value::as_str).map(str::to_string),
            model: body.get("model").and_then(Value::as_str).map(str::to_string),
            stop_reason,
            usage,
            container_id: body
                .get("container")
                .and_then(|c| c.get("id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            content,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_content() {
        let resp = MessagesResponse::from_value(json!({
            "id": "msg_01",
            "model": "claude-sonnet-4-5-20250929",
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 30},
            "container": {"id": "container_abc", "expires_at": "2025-11-20T00:00:00Z"},
            "content": [
                {"type": "text", "text": "Fetching 2020."},
                {"type": "server_tool_use", "id": "srvtoolu_1", "name": "bash_code_execution",
                 "input": {"command": "python3 chart.py"}},
                {"type": "bash_code_execution_tool_result", "tool_use_id": "srvtoolu_1",
                 "content": {"stdout": "ok"}},
                {"type": "tool_use", "id": "toolu_1", "name": "search_and_filter_papers",
                 "input": {"year": 2020}},
                {"type": "thinking", "thinking": "hmm", "signature": "sig"}
            ]
        }))
        .unwrap();

        assert_eq!(resp.stop_reason, StopReason::ToolUse);
        assert_eq!(resp.usage.unwrap().total(), 150);
        assert_eq!(resp.container_id.as_deref(), Some("container_abc"));
        assert_eq!(resp.blocks.len(), 5);
        assert_eq!(
            resp.blocks.iter().map(ContentBlock::block_type).collect::<Vec<_>>(),
            vec![
                "text",
                "server_tool_use",
                "bash_code_execution_tool_result",
                "tool_use",
                "thinking"
            ]
        );
        match &resp.blocks[4] {
            ContentBlock::Unknown { raw, .. } => assert_eq!(raw["signature"], "sig"),
            other => panic!("expected unknown block, got {other:?}"),
        }
    }

    #[test]
    fn missing_stop_reason_is_malformed() {
        let err = MessagesResponse::from_value(json!({"content": []})).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn missing_content_is_malformed() {
        let err = MessagesResponse::from_value(json!({"stop_reason": "end_turn"})).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)));
    }

    #[test]
    fn tool_use_without_id_is_malformed() {
        let err = MessagesResponse::from_value(json!({
            "stop_reason": "tool_use",
            "content": [{"type": "tool_use", "name": "search_and_filter_papers", "input": {}}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn unknown_stop_reason_is_preserved() {
        assert_eq!(
            StopReason::parse("model_context_window_exceeded"),
            StopReason::Other("model_context_window_exceeded".into())
        );
        assert_eq!(StopReason::parse("pause_turn").to_string(), "pause_turn");
    }

    #[test]
    fn request_serializes_both_tool_kinds() {
        let request = MessagesRequest {
            model: "m".into(),
            max_tokens: 10,
            tools: vec![
                ToolDefinition::code_execution(),
                ToolDefinition::Custom {
                    name: "t".into(),
                    description: "d".into(),
                    input_schema: json!({"type": "object"}),
                },
            ],
            messages: vec![
                Message::user_text("hi"),
                Message::assistant_blocks(vec![json!({"type": "text", "text": "yo"})]),
            ],
            container: None,
        };
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(
            v["tools"][0],
            json!({"type": "code_execution_20250825", "name": "code_execution"})
        );
        assert_eq!(v["tools"][1]["input_schema"], json!({"type": "object"}));
        assert_eq!(v["messages"][0], json!({"role": "user", "content": "hi"}));
        assert_eq!(v["messages"][1]["content"][0]["text"], "yo");
        assert!(v.get("container").is_none());
    }
}
