//! Search Backends
//!
//! Abstractions over the external search services the `web` and `wiki`
//! categories query.

mod serpapi;
mod wikipedia;

pub use serpapi::SerpApiClient;
pub use wikipedia::WikipediaClient;

use async_trait::async_trait;

use crate::error::Result;

/// Web search service (Strategy pattern)
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Top result snippets for `query`, at most `num_results`
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>>;

    /// Backend name
    fn name(&self) -> &str;
}

/// Canned results, for tests and demos
pub struct StaticSearchBackend {
    results: Vec<String>,
}

impl StaticSearchBackend {
    pub fn new(results: Vec<String>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    async fn search(&self, _query: &str, num_results: usize) -> Result<Vec<String>> {
        Ok(self.results.iter().take(num_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}
