//! Wikipedia client over the MediaWiki search + extracts API

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{Result, ToolsError};

const WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";

/// Summaries longer than this are cut
const MAX_SUMMARY_CHARS: usize = 4000;

pub struct WikipediaClient {
    client: Client,
    endpoint: String,
}

impl WikipediaClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: WIKIPEDIA_API.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// `Page: <title>\nSummary: <intro>` for the top matching articles
    pub async fn search(&self, query: &str, num_results: usize) -> Result<Vec<String>> {
        let limit = num_results.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolsError::Search(format!("Wikipedia ({status})")));
        }

        let body: WikiResponse = response.json().await?;
        Ok(summaries(body, num_results))
    }
}

#[derive(Debug, Default, Deserialize)]
struct WikiResponse {
    #[serde(default)]
    query: Option<WikiQuery>,
}

#[derive(Debug, Deserialize)]
struct WikiQuery {
    #[serde(default)]
    pages: HashMap<String, WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    extract: String,
    /// Search rank
    #[serde(default)]
    index: u32,
}

fn summaries(body: WikiResponse, limit: usize) -> Vec<String> {
    let mut pages: Vec<WikiPage> = body
        .query
        .map(|q| q.pages.into_values().collect())
        .unwrap_or_default();
    pages.sort_by_key(|p| p.index);

    pages
        .into_iter()
        .take(limit)
        .map(|p| {
            let summary: String = p.extract.trim().chars().take(MAX_SUMMARY_CHARS).collect();
            format!("Page: {}\nSummary: {}", p.title, summary)
        })
        .collect()
}
