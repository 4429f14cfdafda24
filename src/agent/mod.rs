//! Agent module - drives the tool-use conversation that produces the report.
//!
//! Each turn sends the whole transcript, then inspects the response:
//! 1. "end_turn" finishes the run
//! 2. "tool_use" runs every local tool request and appends the results
//! 3. "pause_turn" resends so the service can resume its sandbox work
//!
//! Text blocks shaped like the final chart are captured as they stream past;
//! the last one seen becomes the report.

mod agent_loop;
mod progress;
mod prompt;
mod transcript;

pub use agent_loop::{
    AgentError, AgentSettings, AnalysisOutcome, RunStatus, TrendAgent, FALLBACK_REPORT,
};
pub use progress::ProgressIndicator;
pub use prompt::{is_report_candidate, INITIAL_PROMPT};
pub use transcript::{ToolInvocationResult, Transcript};
