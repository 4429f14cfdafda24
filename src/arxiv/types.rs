use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest and latest year accepted by a search.
pub const MIN_YEAR: i32 = 1000;
pub const MAX_YEAR: i32 = 9999;

/// One normalized arXiv hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub published: NaiveDate,
    pub categories: BTreeSet<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidSearch {
    #[error("year must be a 4-digit calendar year, got {0}")]
    Year(i64),
    #[error("max_results must be greater than zero, got {0}")]
    MaxResults(i64),
}

/// A validated (year, max-results) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest {
    year: i32,
    max_results: usize,
}

impl SearchRequest {
    /// Validate raw tool arguments.
    pub fn new(year: i64, max_results: i64) -> Result<Self, InvalidSearch> {
        if !(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(&year) {
            return Err(InvalidSearch::Year(year));
        }
        if max_results <= 0 {
            return Err(InvalidSearch::MaxResults(max_results));
        }
        Ok(Self {
            year: year as i32,
            max_results: usize::try_from(max_results).unwrap_or(usize::MAX),
        })
    }

    /// Calendar year to search.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Upper bound on returned records.
    pub fn max_results(&self) -> usize {
        self.max_results
    }
}
