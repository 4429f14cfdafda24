//! The `search_and_filter_papers` tool: arXiv search + keyword count.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Tool;
use crate::arxiv::{PaperSource, SearchRequest};
use crate::classifier::KeywordClassifier;

pub const DEFAULT_MAX_RESULTS: i64 = 200;

/// Search one year of cs.AI papers and return only the count summary.
pub struct SearchAndFilterPapers {
    source: Arc<dyn PaperSource>,
    classifier: KeywordClassifier,
}

impl SearchAndFilterPapers {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self::with_classifier(source, KeywordClassifier::default())
    }

    pub fn with_classifier(source: Arc<dyn PaperSource>, classifier: KeywordClassifier) -> Self {
        Self { source, classifier }
    }
}

#[async_trait]
impl Tool for SearchAndFilterPapers {
    fn name(&self) -> &str {
        "search_and_filter_papers"
    }

    fn description(&self) -> &str {
        "Search arxiv papers and filter for Agent-related papers (returns only count summary)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "year": {
                    "type": "integer",
                    "description": "Year to search (2020-2025)"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum papers to return",
                    "default": DEFAULT_MAX_RESULTS
                }
            },
            "required": ["year"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let year = args["year"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("Missing or non-integer 'year' argument"))?;
        let max_results = match &args["max_results"] {
            Value::Null => DEFAULT_MAX_RESULTS,
            v => v
                .as_i64()
                .ok_or_else(|| anyhow::anyhow!("Non-integer 'max_results' argument: {}", v))?,
        };

        let request = SearchRequest::new(year, max_results)?;
        tracing::info!(year, max_results, "searching papers");

        let papers = self.source.search(request).await;
        tracing::info!(year, retrieved = papers.len(), "papers retrieved");

        let summary = self.classifier.classify(&papers, request.year());
        tracing::info!(
            year,
            agent = summary.agent_papers,
            other = summary.other_papers(),
            total = summary.total_papers,
            "filter result"
        );

        Ok(serde_json::to_string(&summary)?)
    }
}
