//! OpenAI Provider
//!
//! Chat Completions API with function-style `tool_calls`.

use std::sync::Arc;

use agent_core::{
    error::{AgentError, Result},
    provider::{ChatModel, ChatRequest, Completion, FinishReason, GenerationOptions, ProviderAdapter, TokenUsage},
    tool::ToolCall,
    trace::TraceMessage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::http::send_json;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl OpenAiAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn id(&self) -> &str {
        "openai"
    }

    fn build(&self, options: GenerationOptions, credential: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        let api_key = credential.ok_or_else(|| AgentError::MissingCredential {
            provider: "openai".into(),
        })?;
        Ok(Arc::new(OpenAiModel {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            options,
        }))
    }
}

pub struct OpenAiModel {
    client: Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

#[async_trait]
impl ChatModel for OpenAiModel {
    fn provider(&self) -> &str {
        "openai"
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let body = build_request(&self.options, request);
        let http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: OpenAiResponse = send_json("openai", http).await?;
        convert_response(response)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<serde_json::Value>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunction {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn build_request(options: &GenerationOptions, request: &ChatRequest) -> OpenAiRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.extend(request.messages.iter().map(format_message));

    OpenAiRequest {
        model: options.model.clone(),
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
        tools: request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema(),
                    }
                })
            })
            .collect(),
    }
}

fn format_message(message: &TraceMessage) -> serde_json::Value {
    match message {
        TraceMessage::UserTurn { content } => json!({"role": "user", "content": content}),
        TraceMessage::AssistantText { content } => json!({"role": "assistant", "content": content}),
        TraceMessage::AssistantToolCall { text, calls } => {
            let tool_calls: Vec<_> = calls
                .iter()
                .map(|call| {
                    json!({
                        "id": call.id.clone().unwrap_or_default(),
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": serde_json::Value::Object(call.arguments_object()).to_string(),
                        }
                    })
                })
                .collect();
            json!({"role": "assistant", "content": text, "tool_calls": tool_calls})
        }
        TraceMessage::ToolResult { call_id, content, .. } => json!({
            "role": "tool",
            "tool_call_id": call_id.clone().unwrap_or_default(),
            "content": content,
        }),
    }
}

fn convert_response(response: OpenAiResponse) -> Result<Completion> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Provider("openai: no choices in response".into()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments: serde_json::Value = if call.function.arguments.trim().is_empty() {
                json!({})
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    AgentError::Provider(format!(
                        "openai: malformed arguments for {}: {}",
                        call.function.name, e
                    ))
                })?
            };
            Ok(ToolCall::new(call.function.name, arguments).with_id(call.id))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Completion {
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        model: response.model,
        usage: response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_vendor),
    })
}
