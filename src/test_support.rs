//! Test doubles shared across module tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::arxiv::{PaperRecord, PaperSource, SearchRequest};
use crate::llm::{LlmClient, LlmError, MessagesRequest, MessagesResponse};

pub(crate) fn paper(title: &str, abstract_text: &str) -> PaperRecord {
    PaperRecord {
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
        published: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        categories: ["cs.AI".to_string()].into_iter().collect(),
    }
}

/// Returns a fixed batch and remembers what it was asked for.
pub(crate) struct StubSource {
    papers: Vec<PaperRecord>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl StubSource {
    pub(crate) fn new(papers: Vec<PaperRecord>) -> Self {
        Self {
            papers,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaperSource for StubSource {
    async fn search(&self, request: SearchRequest) -> Vec<PaperRecord> {
        self.requests.lock().unwrap().push(request);
        self.papers
            .iter()
            .take(request.max_results())
            .cloned()
            .collect()
    }
}

/// Replays a fixed sequence of responses and records every request.
pub(crate) struct ScriptedLlm {
    script: Mutex<VecDeque<Result<MessagesResponse, LlmError>>>,
    pub requests: Mutex<Vec<MessagesRequest>>,
}

impl ScriptedLlm {
    /// Each body goes through the same validation as a live response.
    pub(crate) fn new(script: Vec<Result<Value, LlmError>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|step| step.and_then(MessagesResponse::from_value))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn create_message(&self, request: &MessagesRequest) -> Result<MessagesResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::MalformedResponse("script exhausted".into())))
    }
}

pub(crate) fn response(stop_reason: &str, content: Value) -> Value {
    json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "stop_reason": stop_reason,
        "usage": {"input_tokens": 100, "output_tokens": 10},
        "content": content,
    })
}
