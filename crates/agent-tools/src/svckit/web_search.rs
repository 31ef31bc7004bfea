//! Web Search Tool
//!
//! Performs a web search and returns the top result snippets.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    tool::{ParameterSchema, RunContext},
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::error::ToolsError;
use crate::search::SearchBackend;

const DEFAULT_RESULTS: usize = 5;

/// Tool for web search; reports an error on every call when no backend is configured
pub struct WebSearchTool {
    backend: Option<Arc<dyn SearchBackend>>,
}

impl WebSearchTool {
    pub fn new(backend: Option<Arc<dyn SearchBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "web_search".into(),
            description: "Performs a web search and returns the top search result snippets.".into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "The search query"),
                ParameterSchema::optional(
                    "num_results",
                    "integer",
                    "Number of search results to return",
                    Some(json!(DEFAULT_RESULTS)),
                ),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall, _ctx: &RunContext) -> CoreResult<ToolResult> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| ToolsError::NotConfigured("set SERPAPI_API_KEY to enable web search".into()))?;

        let query = call.string("query")?;
        let num_results = result_count(call, DEFAULT_RESULTS)?;

        tracing::debug!(backend = backend.name(), query, num_results, "Web search");
        let mut results = backend.search(query, num_results).await?;
        if results.is_empty() {
            results.push("No search results found.".into());
        }
        Ok(ToolResult::json("web_search", &json!(results)))
    }
}

/// Optional positive `num_results`, defaulting when absent
pub(crate) fn result_count(call: &ToolCall, default: usize) -> CoreResult<usize> {
    Ok(call
        .optional_number("num_results")?
        .filter(|n| *n >= 1.0)
        .map_or(default, |n| n as usize))
}
