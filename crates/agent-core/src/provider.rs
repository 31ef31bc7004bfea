//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for chat models across vendors (Anthropic,
//! OpenAI, Google, Ollama) so the reasoning loop works with any backend.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ChatModel, ChatRequest};
//!
//! let model = model_provider.get_model("claude-3-5-haiku-20241022")?;
//! let completion = model.complete(&ChatRequest::new(messages)).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::tool::{ToolCall, ToolSchema};
use crate::trace::TraceMessage;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Vendor model name (e.g., "claude-3-5-haiku-20241022", "gpt-4o-mini")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

/// Sampling temperature every model handle is bound to
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

fn default_temperature() -> f32 { DEFAULT_TEMPERATURE }
fn default_max_tokens() -> u32 { 4096 }

impl GenerationOptions {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// One model invocation: system instruction, conversation so far, and the tools on offer
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub messages: Vec<TraceMessage>,
    pub tools: Vec<ToolSchema>,
}

impl ChatRequest {
    pub fn new(messages: Vec<TraceMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text (may be empty when only tools were requested)
    pub content: String,

    /// Structured tool invocations, in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the trace message recorded for this step
    pub fn into_trace(self) -> TraceMessage {
        TraceMessage::from_model_output(self.content, self.tool_calls)
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Map a vendor stop-reason string
    pub fn from_vendor(reason: &str) -> Self {
        match reason {
            "end_turn" | "stop" | "STOP" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" | "length" | "MAX_TOKENS" => FinishReason::Length,
            "tool_use" | "tool_calls" | "function_call" => FinishReason::ToolUse,
            "content_filter" | "SAFETY" => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }
}

/// Information about a model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

/// A live chat-model client bound to one vendor model and a fixed temperature
///
/// Implement this trait to add support for new LLM backends.
/// The agent works exclusively through this interface.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider identifier (e.g., "anthropic")
    fn provider(&self) -> &str;

    /// Generation options this handle is bound to
    fn options(&self) -> &GenerationOptions;

    /// Generate a completion, possibly requesting tools
    async fn complete(&self, request: &ChatRequest) -> Result<Completion>;

    fn model_name(&self) -> &str {
        &self.options().model
    }
}

/// Vendor adapter: builds model handles for one provider identifier
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier used in the model catalog
    fn id(&self) -> &str;

    /// Whether the adapter needs an API credential
    fn requires_credential(&self) -> bool {
        true
    }

    /// Build a handle for `options.model`
    fn build(&self, options: GenerationOptions, credential: Option<&str>) -> Result<Arc<dyn ChatModel>>;
}
