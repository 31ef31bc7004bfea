//! Anthropic (Claude) Provider
//!
//! Messages API with native `tool_use` / `tool_result` content blocks.

use std::sync::Arc;

use agent_core::{
    error::{AgentError, Result},
    provider::{ChatModel, ChatRequest, Completion, FinishReason, GenerationOptions, ProviderAdapter, TokenUsage},
    tool::{ToolCall, ToolSchema},
    trace::TraceMessage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::send_json;

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Builds Claude handles sharing one HTTP client
pub struct AnthropicAdapter {
    client: Client,
    base_url: String,
}

impl Default for AnthropicAdapter {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl AnthropicAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: ANTHROPIC_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ProviderAdapter for AnthropicAdapter {
    fn id(&self) -> &str {
        "anthropic"
    }

    fn build(&self, options: GenerationOptions, credential: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        let api_key = credential.ok_or_else(|| AgentError::MissingCredential {
            provider: "anthropic".into(),
        })?;
        Ok(Arc::new(AnthropicModel {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            options,
        }))
    }
}

pub struct AnthropicModel {
    client: Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

#[async_trait]
impl ChatModel for AnthropicModel {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let body = build_request(&self.options, request);
        let http = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: AnthropicResponse = send_json("anthropic", http).await?;
        Ok(convert_response(response))
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

fn build_request(options: &GenerationOptions, request: &ChatRequest) -> AnthropicRequest {
    AnthropicRequest {
        model: options.model.clone(),
        messages: format_messages(&request.messages),
        system: request.system.clone(),
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        tools: request.tools.iter().map(convert_tool).collect(),
    }
}

fn convert_tool(schema: &ToolSchema) -> AnthropicTool {
    AnthropicTool {
        name: schema.name.clone(),
        description: schema.description.clone(),
        input_schema: schema.input_schema(),
    }
}

/// Convert the trace to Anthropic messages. Consecutive blocks for the same
/// role are merged, so parallel tool results travel in one user message.
fn format_messages(trace: &[TraceMessage]) -> Vec<AnthropicMessage> {
    let mut messages: Vec<AnthropicMessage> = Vec::new();

    for message in trace {
        let (role, blocks) = match message {
            TraceMessage::UserTurn { content } => ("user", text_block(content)),
            TraceMessage::AssistantText { content } => ("assistant", text_block(content)),
            TraceMessage::AssistantToolCall { text, calls } => {
                let mut blocks = text.as_deref().map(text_block).unwrap_or_default();
                blocks.extend(calls.iter().map(|call| ContentBlock::ToolUse {
                    id: call.id.clone().unwrap_or_default(),
                    name: call.name.clone(),
                    input: serde_json::Value::Object(call.arguments_object()),
                }));
                ("assistant", blocks)
            }
            TraceMessage::ToolResult {
                call_id,
                content,
                is_error,
                ..
            } => (
                "user",
                vec![ContentBlock::ToolResult {
                    tool_use_id: call_id.clone().unwrap_or_default(),
                    content: content.clone(),
                    is_error: *is_error,
                }],
            ),
        };
        if blocks.is_empty() {
            continue;
        }

        match messages.last_mut() {
            Some(last) if last.role == role => last.content.extend(blocks),
            _ => messages.push(AnthropicMessage {
                role: role.to_string(),
                content: blocks,
            }),
        }
    }

    messages
}

/// The API rejects empty text blocks; a blank saved answer contributes nothing.
fn text_block(text: &str) -> Vec<ContentBlock> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![ContentBlock::Text { text: text.to_string() }]
    }
}

fn convert_response(response: AnthropicResponse) -> Completion {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text: t } => text.push_str(&t),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall::new(name, input).with_id(id));
            }
            ContentBlock::ToolResult { .. } | ContentBlock::Unsupported => {}
        }
    }

    Completion {
        content: text,
        tool_calls,
        model: response.model,
        usage: response.usage.map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
        finish_reason: response.stop_reason.as_deref().map(FinishReason::from_vendor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::ParameterSchema;
    use serde_json::json;

    #[test]
    fn test_build_requires_key() {
        let adapter = AnthropicAdapter::default();
        let opts = GenerationOptions::for_model("claude-3-5-haiku-20241022");
        assert!(adapter.build(opts.clone(), None).is_err());

        let model = adapter.build(opts, Some("test-key")).unwrap();
        assert_eq!(model.provider(), "anthropic");
        assert_eq!(model.model_name(), "claude-3-5-haiku-20241022");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::new(vec![
            TraceMessage::user("What is 7 * 5?"),
            TraceMessage::AssistantToolCall {
                text: Some("Multiplying.".into()),
                calls: vec![
                    ToolCall::new("multiply", json!({"a": 7, "b": 5})).with_id("toolu_1"),
                    ToolCall::new("add", json!({"a": 1, "b": 1})).with_id("toolu_2"),
                ],
            },
            TraceMessage::ToolResult {
                name: "multiply".into(),
                call_id: Some("toolu_1".into()),
                content: "35.0".into(),
                is_error: false,
            },
            TraceMessage::ToolResult {
                name: "add".into(),
                call_id: Some("toolu_2".into()),
                content: "2.0".into(),
                is_error: false,
            },
        ])
        .with_system("Be brief.")
        .with_tools(vec![ToolSchema {
            name: "multiply".into(),
            description: "Multiply two numbers".into(),
            parameters: vec![
                ParameterSchema::required("a", "number", "first"),
                ParameterSchema::required("b", "number", "second"),
            ],
        }]);

        let body = serde_json::to_value(build_request(
            &GenerationOptions::for_model("claude-3-5-haiku-20241022"),
            &request,
        ))
        .unwrap();

        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["content"][1]["type"], "tool_use");
        assert_eq!(body["messages"][1]["content"][1]["input"], json!({"a": 7, "b": 5}));
        assert_eq!(body["messages"][2]["role"], "user");
        assert_eq!(body["messages"][2]["content"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][2]["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(body["tools"][0]["input_schema"]["required"], json!(["a", "b"]));
    }

    #[test]
    fn test_response_conversion() {
        let response: AnthropicResponse = serde_json::from_value(json!({
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "Let me add those."},
                {"type": "tool_use", "id": "toolu_9", "name": "add", "input": {"a": 35, "b": 12}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }))
        .unwrap();

        let completion = convert_response(response);
        assert_eq!(completion.content, "Let me add those.");
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].id.as_deref(), Some("toolu_9"));
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_blank_saved_answer_is_not_replayed() {
        use agent_core::{AgentResponse, Message};

        let history = [Message::user("q1"), Message::from_response(&AgentResponse::default())];
        let mut window: Vec<TraceMessage> = history.iter().filter_map(TraceMessage::from_history).collect();
        window.push(TraceMessage::user("q2"));

        let body = serde_json::to_value(build_request(
            &GenerationOptions::for_model("claude-3-5-haiku-20241022"),
            &ChatRequest::new(window),
        ))
        .unwrap();

        assert_eq!(
            body["messages"],
            json!([{"role": "user", "content": [
                {"type": "text", "text": "q1"},
                {"type": "text", "text": "q2"}
            ]}])
        );
    }
}
