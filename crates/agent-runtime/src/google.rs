//! Google (Gemini) Provider
//!
//! `generateContent` with `functionCall` / `functionResponse` parts. Gemini
//! issues no call ids, so each call gets a generated one.

use std::sync::Arc;

use agent_core::{
    error::{AgentError, Result},
    provider::{ChatModel, ChatRequest, Completion, FinishReason, GenerationOptions, ProviderAdapter, TokenUsage},
    tool::ToolCall,
    trace::TraceMessage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::send_json;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleAdapter {
    client: Client,
    base_url: String,
}

impl Default for GoogleAdapter {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl GoogleAdapter {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: GEMINI_API_BASE.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ProviderAdapter for GoogleAdapter {
    fn id(&self) -> &str {
        "google"
    }

    fn build(&self, options: GenerationOptions, credential: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        let api_key = credential.ok_or_else(|| AgentError::MissingCredential {
            provider: "google".into(),
        })?;
        Ok(Arc::new(GeminiModel {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
            options,
        }))
    }
}

pub struct GeminiModel {
    client: Client,
    base_url: String,
    api_key: String,
    options: GenerationOptions,
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn provider(&self) -> &str {
        "google"
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        let body = build_request(&self.options, request);
        let http = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.options.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body);

        let response: GeminiResponse = send_json("google", http).await?;
        convert_response(response, &self.options.model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

fn build_request(options: &GenerationOptions, request: &ChatRequest) -> Value {
    let mut contents: Vec<Value> = Vec::new();
    for message in &request.messages {
        let (role, parts) = format_message(message);
        if parts.is_empty() {
            continue;
        }
        match contents.last_mut() {
            Some(last) if last["role"] == role => {
                if let Some(existing) = last["parts"].as_array_mut() {
                    existing.extend(parts);
                }
            }
            _ => contents.push(json!({"role": role, "parts": parts})),
        }
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": options.temperature,
            "maxOutputTokens": options.max_tokens,
        }
    });
    if let Some(system) = &request.system {
        body["systemInstruction"] = json!({"parts": [{"text": system}]});
    }
    if !request.tools.is_empty() {
        let declarations: Vec<_> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": strip_defaults(t.input_schema()),
                })
            })
            .collect();
        body["tools"] = json!([{"functionDeclarations": declarations}]);
    }
    body
}

fn format_message(message: &TraceMessage) -> (&'static str, Vec<Value>) {
    match message {
        TraceMessage::UserTurn { content } => ("user", text_part(content)),
        TraceMessage::AssistantText { content } => ("model", text_part(content)),
        TraceMessage::AssistantToolCall { text, calls } => {
            let mut parts = text.as_deref().map(text_part).unwrap_or_default();
            parts.extend(calls.iter().map(|call| {
                json!({"functionCall": {"name": call.name, "args": Value::Object(call.arguments_object())}})
            }));
            ("model", parts)
        }
        TraceMessage::ToolResult { name, content, .. } => (
            "user",
            vec![json!({"functionResponse": {"name": name, "response": {"content": content}}})],
        ),
    }
}

/// Blank text parts are rejected, so a blank saved answer contributes nothing
fn text_part(text: &str) -> Vec<Value> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![json!({"text": text})]
    }
}

/// Gemini's schema dialect rejects `default`
fn strip_defaults(mut schema: Value) -> Value {
    if let Some(props) = schema["properties"].as_object_mut() {
        for prop in props.values_mut() {
            if let Some(obj) = prop.as_object_mut() {
                obj.remove("default");
            }
        }
    }
    schema
}

fn convert_response(response: GeminiResponse, model: &str) -> Result<Completion> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::Provider("google: no candidates in response".into()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall::new(call.name, call.args).with_id(uuid::Uuid::new_v4().to_string()));
        }
    }

    let finish_reason = if tool_calls.is_empty() {
        candidate.finish_reason.as_deref().map(FinishReason::from_vendor)
    } else {
        Some(FinishReason::ToolUse)
    };

    Ok(Completion {
        content: text,
        tool_calls,
        model: model.to_string(),
        usage: response
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count)),
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::{ParameterSchema, ToolSchema};

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::new(vec![
            TraceMessage::user("Search for rust"),
            TraceMessage::AssistantToolCall {
                text: None,
                calls: vec![ToolCall::new("web_search", json!({"query": "rust"})).with_id("g1")],
            },
            TraceMessage::ToolResult {
                name: "web_search".into(),
                call_id: Some("g1".into()),
                content: "[]".into(),
                is_error: false,
            },
        ])
        .with_system("sys")
        .with_tools(vec![ToolSchema {
            name: "web_search".into(),
            description: "Search".into(),
            parameters: vec![
                ParameterSchema::required("query", "string", "q"),
                ParameterSchema::optional("num_results", "integer", "n", Some(json!(5))),
            ],
        }]);

        let body = build_request(&GenerationOptions::for_model("gemini-1.5-flash"), &request);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "web_search");
        assert_eq!(body["contents"][2]["parts"][0]["functionResponse"]["response"]["content"], "[]");
        let params = &body["tools"][0]["functionDeclarations"][0]["parameters"];
        assert!(params["properties"]["num_results"].get("default").is_none());
    }

    #[test]
    fn test_blank_saved_answer_is_not_replayed() {
        let request = ChatRequest::new(vec![
            TraceMessage::user("q1"),
            TraceMessage::assistant(""),
            TraceMessage::user("q2"),
        ]);

        let body = build_request(&GenerationOptions::for_model("gemini-1.5-flash"), &request);
        assert_eq!(
            body["contents"],
            json!([{"role": "user", "parts": [{"text": "q1"}, {"text": "q2"}]}])
        );
    }

    #[test]
    fn test_function_calls_get_ids() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "get_current_date", "args": {}}},
                    {"functionCall": {"name": "get_current_time", "args": {}}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        }))
        .unwrap();

        let completion = convert_response(response, "gemini-1.5-flash").unwrap();
        assert_eq!(completion.tool_calls.len(), 2);
        assert!(completion.tool_calls.iter().all(|c| c.id.is_some()));
        assert_ne!(completion.tool_calls[0].id, completion.tool_calls[1].id);
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolUse));
    }

    #[test]
    fn test_empty_candidates_is_an_error() {
        let response: GeminiResponse = serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(convert_response(response, "gemini-1.5-flash").is_err());
    }
}
