//! SerpAPI web search client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::SearchBackend;
use crate::error::{Result, ToolsError};

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

pub struct SerpApiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SerpApiClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: SERPAPI_ENDPOINT.into(),
        }
    }

    /// Client from `SERPAPI_API_KEY`; `None` when unset or blank
    pub fn from_env(client: Client) -> Option<Self> {
        std::env::var("SERPAPI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(|key| Self::new(client, key))
    }
}

#[async_trait]
impl SearchBackend for SerpApiClient {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>> {
        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolsError::Search(format!("SerpAPI ({status}): {}", body.trim())));
        }

        let body: Value = response.json().await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(ToolsError::Search(error.to_string()));
        }
        Ok(extract_snippets(&body, num_results))
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}

/// Direct answers first, then organic result snippets
fn extract_snippets(body: &Value, limit: usize) -> Vec<String> {
    let answer_box = &body["answer_box"];
    let direct = [
        answer_box["answer"].as_str(),
        answer_box["snippet"].as_str(),
        body["knowledge_graph"]["description"].as_str(),
    ];

    let organic = body["organic_results"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|r| r["snippet"].as_str());

    direct
        .into_iter()
        .flatten()
        .chain(organic)
        .map(str::to_string)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snippet_extraction() {
        let body = json!({
            "answer_box": {"answer": "42"},
            "organic_results": [
                {"title": "a", "snippet": "first"},
                {"title": "b"},
                {"title": "c", "snippet": "second"}
            ]
        });
        assert_eq!(extract_snippets(&body, 5), vec!["42", "first", "second"]);
        assert_eq!(extract_snippets(&body, 2), vec!["42", "first"]);
        assert!(extract_snippets(&json!({}), 5).is_empty());
    }
}
