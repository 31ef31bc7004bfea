//! Conversation Messages
//!
//! Persisted chat history records and the structured outcome of a reasoning run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
    /// Anything else found in stored history; never sent to a model
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// A single persisted turn in an agent's chat history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Tool steps behind an assistant answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<ConversationStep>>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            steps: None,
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant message recording a parsed run; tool-only turns collapse into this one record.
    pub fn from_response(response: &AgentResponse) -> Self {
        let mut msg = Self::assistant(response.final_answer.clone());
        if !response.steps.is_empty() {
            msg.steps = Some(response.steps.clone());
        }
        msg
    }
}

/// Output recorded against a step once its tool result arrives
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepOutput {
    Number(f64),
    Text(String),
}

impl StepOutput {
    /// Numeric when the raw text is a finite floating-point literal, text otherwise.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => StepOutput::Number(n),
            _ => StepOutput::Text(raw.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StepOutput::Number(_) => None,
            StepOutput::Text(s) => Some(s),
        }
    }
}

/// One tool invocation recorded during reasoning
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationStep {
    /// "Step N", 1-indexed per response
    #[serde(rename = "step")]
    pub step_label: String,

    /// Text the model emitted right before the call
    pub description: Option<String>,

    pub tool_used: String,

    pub input: serde_json::Map<String, serde_json::Value>,

    pub output: Option<StepOutput>,

    /// Vendor call id, when the vendor supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

/// The parsed outcome of one reasoning run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub steps: Vec<ConversationStep>,
    pub final_answer: String,
}
