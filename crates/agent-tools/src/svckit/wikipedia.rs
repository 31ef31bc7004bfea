//! Wikipedia Search Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use agent_core::{
    tool::{ParameterSchema, RunContext},
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use super::web_search::result_count;
use crate::search::WikipediaClient;

const DEFAULT_RESULTS: usize = 3;

pub struct WikipediaSearchTool {
    client: Arc<WikipediaClient>,
}

impl WikipediaSearchTool {
    pub fn new(client: Arc<WikipediaClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WikipediaSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "wikipedia_search".into(),
            description: "Searches Wikipedia and returns the top article summaries.".into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "Search term for Wikipedia"),
                ParameterSchema::optional(
                    "num_results",
                    "integer",
                    "Number of articles to return",
                    Some(json!(DEFAULT_RESULTS)),
                ),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall, _ctx: &RunContext) -> CoreResult<ToolResult> {
        let query = call.string("query")?;
        let num_results = result_count(call, DEFAULT_RESULTS)?;

        let mut summaries = self.client.search(query, num_results).await?;
        if summaries.is_empty() {
            summaries.push("No Wikipedia results found.".into());
        }
        Ok(ToolResult::json("wikipedia_search", &json!(summaries)))
    }
}
