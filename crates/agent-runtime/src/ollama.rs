//! Ollama LLM Provider
//!
//! Local inference through Ollama's `/api/chat`. Tools are offered through
//! the system prompt and requested with fenced ```` ```tool ```` JSON blocks,
//! so any local model can drive them.

use std::sync::Arc;

use agent_core::{
    error::Result,
    provider::{ChatModel, ChatRequest, Completion, FinishReason, GenerationOptions, ProviderAdapter, TokenUsage},
    tool::{generate_prompt_section, ToolCall},
    trace::TraceMessage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::send_json;

const TOOL_FENCE: &str = "```tool";

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let host = lookup("OLLAMA_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("OLLAMA_PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// Keyless adapter for a local Ollama daemon
pub struct OllamaAdapter {
    client: Client,
    config: OllamaConfig,
}

impl OllamaAdapter {
    pub fn new(client: Client, config: OllamaConfig) -> Self {
        Self { client, config }
    }

    /// Create from environment variables
    pub fn from_env(client: Client) -> Self {
        Self::new(client, OllamaConfig::from_env())
    }
}

impl ProviderAdapter for OllamaAdapter {
    fn id(&self) -> &str {
        "ollama"
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn build(&self, options: GenerationOptions, _credential: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        Ok(Arc::new(OllamaModel {
            client: self.client.clone(),
            base_url: self.config.base_url(),
            options,
        }))
    }
}

pub struct OllamaModel {
    client: Client,
    base_url: String,
    options: GenerationOptions,
}

#[async_trait]
impl ChatModel for OllamaModel {
    fn provider(&self) -> &str {
        "ollama"
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let body = build_request(&self.options, request);
        let http = self.client.post(format!("{}/api/chat", self.base_url)).json(&body);

        let response: OllamaResponse = send_json("ollama", http).await?;
        Ok(convert_response(response))
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
}

fn build_request(options: &GenerationOptions, request: &ChatRequest) -> OllamaRequest {
    let mut system = request.system.clone().unwrap_or_default();
    if !request.tools.is_empty() {
        if !system.is_empty() {
            system.push_str("\n\n");
        }
        system.push_str(&generate_prompt_section(&request.tools));
        system.push_str("Request one tool per ```tool block. After the results come back, answer the user.");
    }

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !system.is_empty() {
        messages.push(OllamaMessage {
            role: "system".into(),
            content: system,
        });
    }
    messages.extend(request.messages.iter().map(format_message));

    OllamaRequest {
        model: options.model.clone(),
        messages,
        stream: false,
        options: OllamaOptions {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        },
    }
}

fn format_message(message: &TraceMessage) -> OllamaMessage {
    let (role, content) = match message {
        TraceMessage::UserTurn { content } => ("user", content.clone()),
        TraceMessage::AssistantText { content } => ("assistant", content.clone()),
        TraceMessage::AssistantToolCall { text, calls } => {
            let mut content = text.clone().unwrap_or_default();
            for call in calls {
                let block = serde_json::json!({"tool": call.name, "arguments": call.arguments_object()});
                content.push_str(&format!("\n{TOOL_FENCE}\n{block}\n```\n"));
            }
            ("assistant", content.trim_start().to_string())
        }
        // Tool results appear as user context
        TraceMessage::ToolResult {
            name,
            content,
            is_error,
            ..
        } => ("user", format_tool_result(name, content, *is_error)),
    };
    OllamaMessage {
        role: role.into(),
        content,
    }
}

fn format_tool_result(name: &str, output: &str, is_error: bool) -> String {
    if is_error {
        format!("[Tool '{}' failed]\n{}", name, output)
    } else {
        format!("[Tool '{}' returned]\n{}", name, output)
    }
}

/// Split model output into leading text and the tool calls it requests.
fn parse_tool_calls(content: &str) -> (String, Vec<ToolCall>) {
    let mut calls = Vec::new();
    let mut rest = content;
    let mut text_end = None;

    while let Some(start) = rest.find(TOOL_FENCE) {
        let after_marker = &rest[start + TOOL_FENCE.len()..];
        let Some(end) = after_marker.find("```") else {
            break;
        };
        if let Ok(call) = serde_json::from_str::<ToolCall>(after_marker[..end].trim()) {
            text_end.get_or_insert(content.len() - rest.len() + start);
            calls.push(call);
        }
        rest = &after_marker[end + 3..];
    }

    if calls.is_empty() {
        if let Some(call) = parse_inline_tool_call(content) {
            return (String::new(), vec![with_call_id(call)]);
        }
        return (content.to_string(), calls);
    }

    let text = content[..text_end.unwrap_or(content.len())].trim().to_string();
    (text, calls.into_iter().map(with_call_id).collect())
}

/// Fallback: the whole reply is a bare JSON object with a "tool" key
fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
}

fn with_call_id(mut call: ToolCall) -> ToolCall {
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    call
}

fn convert_response(response: OllamaResponse) -> Completion {
    let (content, tool_calls) = parse_tool_calls(&response.message.content);
    let finish_reason = if tool_calls.is_empty() {
        Some(FinishReason::from_vendor(response.done_reason.as_deref().unwrap_or("stop")))
    } else {
        Some(FinishReason::ToolUse)
    };

    Completion {
        content,
        tool_calls,
        model: response.model,
        usage: Some(TokenUsage::new(
            response.prompt_eval_count.unwrap_or(0),
            response.eval_count.unwrap_or(0),
        )),
        finish_reason,
    }
}
