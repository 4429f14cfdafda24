//! Locally executed tools and the dispatcher that routes model requests to them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::arxiv::PaperSource;
use crate::llm::ToolDefinition;

mod papers;

pub use papers::{SearchAndFilterPapers, DEFAULT_MAX_RESULTS};

/// A capability the model can ask the client to run.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Name + description pair, for logging and prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry of locally executed tools, keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the paper search tool backed by `source`.
    pub fn with_paper_source(source: Arc<dyn PaperSource>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SearchAndFilterPapers::new(source)));
        registry
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// List registered tools, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut tools: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Definitions for every registered tool, in name order.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| ToolDefinition::Custom {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect()
    }

    /// Run the named tool and return its textual result.
    ///
    /// Never fails: the result is mandatory protocol content, so unknown
    /// names and tool errors come back as text.
    pub async fn dispatch(&self, name: &str, args: Value) -> String {
        tracing::info!(tool = name, input = %args, "processing tool call");

        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return format!("Unknown tool: {}", name);
        };

        match tool.execute(args).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool execution failed");
                format!("Error: {}", e)
            }
        }
    }
}
