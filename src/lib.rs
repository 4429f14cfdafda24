//! # arXiv agent trend
//!
//! Measures how much of arXiv's cs.AI output is agent research, year by year,
//! and has Claude render the result as an ASCII bar chart.
//!
//! This library provides:
//! - An arXiv Atom API client and a keyword classifier
//! - A tool registry exposing `search_and_filter_papers` to the model
//! - A tool-use conversation loop against the Claude Messages API
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Send the task instruction with the paper tool and code execution
//! 2. Run every paper search the model asks for and feed the summaries back
//! 3. Let the model chart the numbers in its code-execution sandbox
//! 4. Keep the last chart-shaped text block as the report
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use arxiv_trend::{agent::{AgentSettings, TrendAgent}, arxiv::ArxivClient,
//!     config::Config, llm::AnthropicClient, tools::ToolRegistry};
//!
//! let config = Config::from_env()?;
//! let source = Arc::new(ArxivClient::new(&config.arxiv)?);
//! let agent = TrendAgent::new(
//!     Arc::new(AnthropicClient::new(&config)?),
//!     ToolRegistry::with_paper_source(source),
//!     AgentSettings::from_config(&config),
//! );
//! let outcome = agent.run().await;
//! println!("{}", outcome.report);
//! ```

pub mod agent;
pub mod arxiv;
pub mod classifier;
pub mod config;
pub mod llm;
pub mod logging;
pub mod report;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use report::ReportWriter;
