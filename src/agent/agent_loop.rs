//! The turn engine: request, inspect, run local tools, repeat.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::llm::{
    ContentBlock, LlmClient, LlmError, MessagesRequest, MessagesResponse, StopReason,
    ToolDefinition, Usage,
};
use crate::tools::ToolRegistry;

use super::progress::ProgressIndicator;
use super::prompt::{is_report_candidate, INITIAL_PROMPT};
use super::transcript::{ToolInvocationResult, Transcript};

/// Written when no qualifying text block was ever seen.
pub const FALLBACK_REPORT: &str = "# Analysis completed but no markdown result found";

const TEXT_LOG_LIMIT: usize = 200;
const RESULT_LOG_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("turn {turn}: AI service call failed: {source}")]
    Llm {
        turn: usize,
        #[source]
        source: LlmError,
    },
    #[error("turn {turn}: conversation stopped unexpectedly ({stop_reason})")]
    UnexpectedStop { turn: usize, stop_reason: StopReason },
    #[error("no end of turn after {0} requests")]
    TurnLimit(usize),
}

#[derive(Debug)]
pub enum RunStatus {
    Completed,
    Failed(AgentError),
}

/// What a run produced. `report` is always usable, even on failure.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub report: String,
    pub status: RunStatus,
    /// Requests sent to the AI service.
    pub turns: usize,
    pub usage: Usage,
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }
}

/// Per-run knobs taken from the configuration.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub max_turns: usize,
    pub show_progress: bool,
}

impl AgentSettings {
    /// Copy the agent-relevant settings out of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_turns: config.max_turns,
            show_progress: config.show_progress,
        }
    }
}

/// Keeps the most recent text block that looks like the final report.
#[derive(Debug, Default)]
struct ReportCapture {
    latest: Option<String>,
}

impl ReportCapture {
    fn observe(&mut self, text: &str) {
        if is_report_candidate(text) {
            self.latest = Some(text.trim().to_string());
        }
    }

    fn into_report(self) -> String {
        self.latest.unwrap_or_else(|| FALLBACK_REPORT.to_string())
    }
}

/// Mutable state of one run.
struct RunState {
    transcript: Transcript,
    capture: ReportCapture,
    container: Option<String>,
    turns: usize,
    usage: Usage,
}

/// The trend analysis agent.
pub struct TrendAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    settings: AgentSettings,
}

impl TrendAgent {
    /// Create an agent that talks to `llm` and answers requests from `tools`.
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, settings: AgentSettings) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    /// Run the six-year analysis with the built-in task instruction.
    pub async fn run(&self) -> AnalysisOutcome {
        self.run_with_prompt(INITIAL_PROMPT).await
    }

    /// Run the conversation from a custom first user message.
    pub async fn run_with_prompt(&self, prompt: &str) -> AnalysisOutcome {
        tracing::info!(model = %self.settings.model, max_turns = self.settings.max_turns, "starting analysis");

        let mut state = RunState {
            transcript: Transcript::new(prompt),
            capture: ReportCapture::default(),
            container: None,
            turns: 0,
            usage: Usage::default(),
        };

        let status = match self.converse(&mut state).await {
            Ok(()) => {
                tracing::info!(turns = state.turns, "conversation completed");
                RunStatus::Completed
            }
            Err(e) => {
                tracing::error!(error = %e, "analysis terminated");
                RunStatus::Failed(e)
            }
        };

        tracing::info!(
            input_tokens = state.usage.input_tokens,
            output_tokens = state.usage.output_tokens,
            total_tokens = state.usage.total(),
            "run token usage"
        );

        AnalysisOutcome {
            report: state.capture.into_report(),
            status,
            turns: state.turns,
            usage: state.usage,
        }
    }

    async fn converse(&self, state: &mut RunState) -> Result<(), AgentError> {
        let mut tools = vec![ToolDefinition::code_execution()];
        tools.extend(self.tools.get_tool_schemas());

        while state.turns < self.settings.max_turns {
            state.turns += 1;
            let turn = state.turns;

            let chars = state.transcript.char_count();
            tracing::info!(
                turn,
                messages = state.transcript.len(),
                chars,
                estimated_tokens = chars / 4,
                roles = ?state.transcript.recent_roles(5),
                "sending request"
            );

            let request = MessagesRequest {
                model: self.settings.model.clone(),
                max_tokens: self.settings.max_tokens,
                tools: tools.clone(),
                messages: state.transcript.messages().to_vec(),
                container: state.container.clone(),
            };

            let response = self
                .send(&request)
                .await
                .map_err(|source| AgentError::Llm { turn, source })?;

            self.inspect(turn, &response, state);

            match response.stop_reason {
                StopReason::EndTurn => return Ok(()),
                StopReason::ToolUse => {
                    let results = self.execute_tools(&response.blocks).await;
                    tracing::info!(turn, results = results.len(), "appending tool results");
                    state.transcript.push_assistant(response.content);
                    state.transcript.push_tool_results(&results);
                }
                StopReason::PauseTurn => {
                    tracing::info!(turn, "turn paused by the service, resuming");
                    state.transcript.push_assistant(response.content);
                }
                stop_reason => return Err(AgentError::UnexpectedStop { turn, stop_reason }),
            }
        }

        Err(AgentError::TurnLimit(self.settings.max_turns))
    }

    async fn send(&self, request: &MessagesRequest) -> Result<MessagesResponse, LlmError> {
        let started = Instant::now();
        let progress = self
            .settings
            .show_progress
            .then(|| ProgressIndicator::start("Processing"));

        let result = self.llm.create_message(request).await;

        if let Some(progress) = progress {
            progress.stop().await;
        }
        tracing::info!(elapsed_secs = started.elapsed().as_secs_f64(), "request finished");
        result
    }

    /// Record usage and container, log every block, and update the captured report.
    fn inspect(&self, turn: usize, response: &MessagesResponse, state: &mut RunState) {
        if let Some(usage) = &response.usage {
            tracing::info!(
                turn,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total(),
                "token usage"
            );
            state.usage.add(usage);
        }
        tracing::info!(
            turn,
            id = response.id.as_deref().unwrap_or("-"),
            model = response.model.as_deref().unwrap_or("-"),
            stop_reason = %response.stop_reason,
            blocks = response.blocks.len(),
            "received response"
        );

        if let Some(id) = &response.container_id {
            if state.container.as_deref() != Some(id.as_str()) {
                tracing::debug!(container = %id, "using code execution container");
                state.container = Some(id.clone());
            }
        }

        for (index, block) in response.blocks.iter().enumerate() {
            log_block(turn, index, block);
            if let ContentBlock::Text { text } = block {
                state.capture.observe(text);
            }
        }
    }

    /// Answer every local tool request; platform tool activity is skipped.
    async fn execute_tools(&self, blocks: &[ContentBlock]) -> Vec<ToolInvocationResult> {
        let mut results = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::ToolUse { id, name, input } => {
                    let payload = self.tools.dispatch(name, input.clone()).await;
                    tracing::info!(tool = %name, id = %id, "tool execution completed");
                    results.push(ToolInvocationResult {
                        invocation_id: id.clone(),
                        payload,
                    });
                }
                ContentBlock::ServerToolUse { name, .. } => {
                    tracing::debug!(tool = %name, "server tool handled by the service");
                }
                _ => {}
            }
        }
        results
    }
}

fn log_block(turn: usize, index: usize, block: &ContentBlock) {
    match block {
        ContentBlock::Text { text } => {
            tracing::info!(turn, index, text = %truncate_for_log(text, TEXT_LOG_LIMIT), "text block");
        }
        ContentBlock::ToolUse { id, name, input } => {
            tracing::info!(turn, index, tool = %name, id = %id, input = %input, "tool request");
        }
        ContentBlock::ServerToolUse { id, name, input } => {
            tracing::info!(turn, index, tool = %name, id = %id, input = %input, "server tool activity");
            if name == "text_editor_code_execution" || name == "bash_code_execution" {
                if let Some(code) = input.get("file_text").and_then(Value::as_str) {
                    tracing::info!(turn, "generated code:\n{}", code);
                } else if let Some(command) = input.get("command").and_then(Value::as_str) {
                    tracing::info!(turn, command, "bash command");
                }
            }
        }
        ContentBlock::ToolResult {
            block_type,
            tool_use_id,
            content,
        } => {
            tracing::info!(
                turn,
                index,
                kind = %block_type,
                tool_use_id = %tool_use_id,
                content = %truncate_for_log(&content.to_string(), RESULT_LOG_LIMIT),
                "tool result"
            );
            if let Some(stdout) = content.get("stdout").and_then(Value::as_str) {
                tracing::info!(turn, "stdout:\n{}", stdout);
            }
        }
        ContentBlock::Unknown { block_type, raw } => {
            tracing::warn!(turn, index, kind = %block_type, raw = %raw, "unrecognized content block");
        }
    }
}

fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}
