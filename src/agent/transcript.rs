use serde_json::{json, Value};

use crate::llm::{Message, Role};

/// Answer to one local tool request; `invocation_id` echoes the request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationResult {
    pub invocation_id: String,
    pub payload: String,
}

impl ToolInvocationResult {
    fn to_block(&self) -> Value {
        json!({
            "type": "tool_result",
            "tool_use_id": self.invocation_id,
            "content": self.payload,
        })
    }
}

/// Append-only conversation history for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript seeded with the task instruction.
    pub fn new(initial_prompt: &str) -> Self {
        let mut transcript = Self::default();
        transcript.push_user_text(initial_prompt);
        transcript
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user_text(text));
    }

    /// Append assistant content exactly as the service returned it.
    pub fn push_assistant(&mut self, content: Vec<Value>) {
        self.messages.push(Message::assistant_blocks(content));
    }

    /// Append all results of one turn as a single user message.
    pub fn push_tool_results(&mut self, results: &[ToolInvocationResult]) {
        if results.is_empty() {
            return;
        }
        self.messages.push(Message::user_blocks(
            results.iter().map(ToolInvocationResult::to_block).collect(),
        ));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialized size, for input-size logging.
    pub fn char_count(&self) -> usize {
        self.messages
            .iter()
            .map(|m| serde_json::to_string(m).map(|s| s.chars().count()).unwrap_or(0))
            .sum()
    }

    pub fn recent_roles(&self, n: usize) -> Vec<Role> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages[skip..].iter().map(|m| m.role).collect()
    }
}
