//! Error Types for Tool Backends

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Search backend error: {0}")]
    Search(String),

    #[error("Search not configured: {0}")]
    NotConfigured(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Document store error: {0}")]
    Storage(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(String),

    #[error("Error processing PDF: {0}")]
    Pdf(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ToolsError> for AgentError {
    fn from(err: ToolsError) -> Self {
        AgentError::ToolExecution(err.to_string())
    }
}
