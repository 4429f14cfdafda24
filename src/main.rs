//! arxiv-trend - command line entry point
//!
//! Runs the cs.AI agent-research trend analysis once and writes the chart to
//! the configured output file.

use std::sync::Arc;

use anyhow::Context;
use arxiv_trend::{
    agent::{AgentSettings, RunStatus, TrendAgent},
    arxiv::ArxivClient,
    config::{Config, LoggingConfig},
    llm::AnthropicClient,
    logging,
    tools::ToolRegistry,
    ReportWriter,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LoggingConfig::from_env())?;
            error!(error = %e, "configuration error");
            return Err(e.into());
        }
    };
    logging::init(&config.logging)?;
    info!(
        model = %config.model,
        output = %config.output_path.display(),
        "loaded configuration"
    );

    let llm = Arc::new(AnthropicClient::new(&config).context("building AI service client")?);
    let source = Arc::new(ArxivClient::new(&config.arxiv).context("building arXiv client")?);
    let registry = ToolRegistry::with_paper_source(source);
    for tool in registry.list_tools() {
        info!(tool = %tool.name, "registered tool");
    }

    let agent = TrendAgent::new(llm, registry, AgentSettings::from_config(&config));
    let outcome = agent.run().await;
    info!(
        turns = outcome.turns,
        total_tokens = outcome.usage.total(),
        success = outcome.is_success(),
        "analysis finished"
    );

    let writer = ReportWriter::new(&config.output_path);
    if let Err(e) = writer.emit(&outcome.report).await {
        error!(error = %e, "failed to write report");
        return Err(e.into());
    }
    println!("{}", outcome.report);

    match outcome.status {
        RunStatus::Completed => Ok(()),
        RunStatus::Failed(e) => Err(e).context("analysis did not complete"),
    }
}
