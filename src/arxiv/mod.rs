//! Literature query adapter over the arXiv Atom API.

use async_trait::async_trait;

pub mod client;
pub mod types;

pub use client::{ArxivClient, ArxivError};
pub use types::{InvalidSearch, PaperRecord, SearchRequest};

/// A source of paper metadata for one calendar year.
///
/// Implementations absorb provider failures: a failed query yields an empty
/// sequence, never an error, because the caller must always answer the
/// model's tool request with some result.
#[async_trait]
pub trait PaperSource: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Vec<PaperRecord>;
}
