//! Keyword classifier: reduces a year's papers to a single summary.

use serde::{Deserialize, Serialize};

use crate::arxiv::PaperRecord;

/// Keywords marking a paper as agent research.
pub const AGENT_KEYWORDS: &[&str] = &[
    "agent",
    "multi-agent",
    "agentic",
    "planning",
    "reasoning",
    "tool calling",
    "tool use",
];

/// Count summary for one year. Invariant: `agent_papers <= total_papers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub total_papers: usize,
    pub agent_papers: usize,
}

impl YearSummary {
    pub fn other_papers(&self) -> usize {
        self.total_papers - self.agent_papers
    }
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(AGENT_KEYWORDS.iter().copied())
    }
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive substring match over title + abstract.
    pub fn matches(&self, paper: &PaperRecord) -> bool {
        let text = format!(
            "{} {}",
            paper.title.to_lowercase(),
            paper.abstract_text.to_lowercase()
        );
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn classify(&self, papers: &[PaperRecord], year: i32) -> YearSummary {
        YearSummary {
            year,
            total_papers: papers.len(),
            agent_papers: papers.iter().filter(|p| self.matches(p)).count(),
        }
    }
}

/// Classify with the default keyword set.
pub fn classify(papers: &[PaperRecord], year: i32) -> YearSummary {
    KeywordClassifier::default().classify(papers, year)
}
