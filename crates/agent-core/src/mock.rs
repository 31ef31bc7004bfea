//! Scripted Model
//!
//! For testing and demo purposes. Plays back a fixed sequence of completions
//! and records every request it receives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::provider::{ChatModel, ChatRequest, Completion, FinishReason, GenerationOptions, ProviderAdapter};
use crate::tool::ToolCall;

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<Completion>>,
    requests: Vec<ChatRequest>,
}

/// Chat model that answers from a script. Clones share the script.
#[derive(Clone)]
pub struct ScriptedModel {
    script: Arc<Mutex<Script>>,
    options: GenerationOptions,
    provider: String,
    delay: Option<Duration>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::default())),
            options: GenerationOptions::for_model("scripted"),
            provider: "mock".into(),
            delay: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn then_completion(self, completion: Completion) -> Self {
        self.lock().replies.push_back(Ok(completion));
        self
    }

    /// Queue a plain-text answer
    pub fn then_text(self, text: &str) -> Self {
        let model = self.options.model.clone();
        self.then_completion(Completion::text(model, text))
    }

    /// Queue a tool-calling turn with no preamble
    pub fn then_tools(self, calls: Vec<ToolCall>) -> Self {
        self.then_text_and_tools("", calls)
    }

    /// Queue a tool-calling turn preceded by text
    pub fn then_text_and_tools(self, text: &str, calls: Vec<ToolCall>) -> Self {
        let completion = Completion {
            content: text.into(),
            tool_calls: calls,
            model: self.options.model.clone(),
            usage: None,
            finish_reason: Some(FinishReason::ToolUse),
        };
        self.then_completion(completion)
    }

    pub fn then_error(self, error: AgentError) -> Self {
        self.lock().replies.push_back(Err(error));
        self
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock().requests.clone()
    }

    fn bound(&self, provider: &str, options: GenerationOptions) -> Self {
        Self {
            script: Arc::clone(&self.script),
            options,
            provider: provider.into(),
            delay: self.delay,
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn complete(&self, request: &ChatRequest) -> Result<Completion> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut script = self.lock();
        script.requests.push(request.clone());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Provider("scripted model has no replies left".into())))
    }
}

/// Adapter handing out handles onto one shared [`ScriptedModel`]
pub struct MockAdapter {
    id: String,
    model: ScriptedModel,
    requires_credential: bool,
}

impl MockAdapter {
    pub fn new(id: &str, model: ScriptedModel) -> Self {
        Self {
            id: id.into(),
            model,
            requires_credential: true,
        }
    }

    pub fn keyless(id: &str, model: ScriptedModel) -> Self {
        Self {
            requires_credential: false,
            ..Self::new(id, model)
        }
    }
}

impl ProviderAdapter for MockAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn requires_credential(&self) -> bool {
        self.requires_credential
    }

    fn build(&self, options: GenerationOptions, _credential: Option<&str>) -> Result<Arc<dyn ChatModel>> {
        Ok(Arc::new(self.model.bound(&self.id, options)))
    }
}
