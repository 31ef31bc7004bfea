//! Conversation Engine
//!
//! Caller-facing operations over the model catalog, tool registry and chat
//! history: plain questions, tool-augmented runs, per-agent chat with history
//! persistence, and catalog listings.
//!
//! ```text
//! question ─▶ ContextBudgetAssembler ─▶ Agent (model + tools) ─▶ parse_trace ─▶ AgentResponse
//!                 ▲                                                                │
//!                 └────────────── HistoryStore ◀──── append (chat only) ◀──────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::context::ContextBudgetAssembler;
use crate::error::{AgentError, Result};
use crate::history::{AuthorizationCheck, HistoryStore};
use crate::message::{AgentResponse, Message};
use crate::model::ModelProvider;
use crate::parser::parse_trace;
use crate::provider::{ChatModel, ChatRequest, ModelInfo};
use crate::reasoning::{Agent, AgentConfig, DEFAULT_SYSTEM_PROMPT};
use crate::tool::{CategoryInfo, RunContext, ToolRegistry};
use crate::trace::TraceMessage;

/// Answer to a single-turn question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub model: String,
}

/// A tool-augmented question
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentRequest {
    pub question: String,

    #[serde(default, alias = "model")]
    pub model_id: Option<String>,

    /// Categories to enable; `None` or empty enables all
    #[serde(default)]
    pub tool_categories: Option<Vec<String>>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub agent_id: Option<String>,
}

impl AgentRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.tool_categories = Some(categories.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Process-wide engine. Shared collaborators are read-only; per-agent history
/// writes are serialized through an agent-keyed lock.
pub struct ConversationEngine {
    models: Arc<ModelProvider>,
    tools: Arc<ToolRegistry>,
    history: Arc<dyn HistoryStore>,
    access: Option<Arc<dyn AuthorizationCheck>>,
    config: EngineConfig,
    system_prompt: String,
    agent_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationEngine {
    pub fn new(
        models: Arc<ModelProvider>,
        tools: Arc<ToolRegistry>,
        history: Arc<dyn HistoryStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            models,
            tools,
            history,
            access: None,
            config,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            agent_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Require `chat` callers to own the agent
    pub fn with_access_check(mut self, access: Arc<dyn AuthorizationCheck>) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn model_id<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(&self.config.default_model)
    }

    /// Single turn, no tools, no history
    pub async fn ask(&self, question: &str, model_id: Option<&str>) -> Result<AskResponse> {
        let model_id = self.model_id(model_id);
        let model = self.models.get_model(model_id)?;
        let request = ChatRequest::new(vec![TraceMessage::user(question)]);

        let completion = tokio::time::timeout(self.config.model_timeout, model.complete(&request))
            .await
            .map_err(|_| AgentError::Timeout(self.config.model_timeout.as_secs()))??;

        Ok(AskResponse {
            answer: completion.content,
            model: model_id.to_string(),
        })
    }

    /// Tool-augmented run over the agent's history. Never writes history.
    pub async fn ask_with_tools(&self, request: &AgentRequest) -> Result<AgentResponse> {
        let model = self.models.get_model(self.model_id(request.model_id.as_deref()))?;
        if let Some(agent_id) = request.agent_id.as_deref() {
            self.authorize(request.user_id.as_deref(), agent_id).await?;
        }
        self.run(model, request).await
    }

    /// Full chat turn for a stored agent: run, then append the question and
    /// the answer (with its steps) to the agent's history.
    pub async fn chat(&self, agent_id: &str, request: AgentRequest) -> Result<AgentResponse> {
        let model = self.models.get_model(self.model_id(request.model_id.as_deref()))?;
        self.authorize(request.user_id.as_deref(), agent_id).await?;

        let lock = self.agent_lock(agent_id).await;
        let result = {
            let _guard = lock.lock().await;
            let request = AgentRequest {
                agent_id: Some(agent_id.to_string()),
                ..request
            };
            let asked = Message::user(request.question.clone());
            match self.run(model, &request).await {
                Ok(response) => self
                    .history
                    .append(agent_id, vec![asked, Message::from_response(&response)])
                    .await
                    .map(|()| response),
                Err(e) => Err(e),
            }
        };
        self.release_agent_lock(agent_id, lock).await;
        result
    }

    pub async fn history(&self, agent_id: &str) -> Result<Vec<Message>> {
        self.require_agent(agent_id).await?;
        self.history.get(agent_id).await
    }

    pub async fn clear_history(&self, agent_id: &str) -> Result<()> {
        self.require_agent(agent_id).await?;
        let lock = self.agent_lock(agent_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.history.clear(agent_id).await
        };
        self.release_agent_lock(agent_id, lock).await;
        result
    }

    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.models.list_models()
    }

    pub fn list_tools(&self) -> BTreeMap<String, CategoryInfo> {
        self.tools.describe()
    }

    async fn run(&self, model: Arc<dyn ChatModel>, request: &AgentRequest) -> Result<AgentResponse> {
        let history = match request.agent_id.as_deref() {
            Some(agent_id) => self.history.get(agent_id).await?,
            None => Vec::new(),
        };

        let window = ContextBudgetAssembler::new(self.config.token_budget, self.config.recent_window)
            .assemble(&history, &request.question);
        let tools = self.tools.resolve(request.tool_categories.as_deref());

        let agent = Agent::new(
            model,
            tools,
            AgentConfig {
                system_prompt: self.system_prompt.clone(),
                max_steps: self.config.max_steps,
                step_timeout: self.config.model_timeout,
            },
        );

        let ctx = RunContext::new(request.user_id.clone(), request.agent_id.clone());
        let trace = agent.run(window, &ctx).await?;
        let response = parse_trace(&trace.messages);

        tracing::debug!(
            agent_id = ?request.agent_id,
            steps = response.steps.len(),
            model_steps = trace.steps_taken,
            hit_step_limit = trace.hit_step_limit,
            "Agent run complete"
        );
        Ok(response)
    }

    /// With an access check configured, the agent must be known.
    async fn require_agent(&self, agent_id: &str) -> Result<Option<String>> {
        let Some(access) = &self.access else {
            return Ok(None);
        };
        match access.owner(agent_id).await? {
            Some(owner) => Ok(Some(owner)),
            None => Err(AgentError::AgentNotFound(agent_id.to_string())),
        }
    }

    /// With an access check configured, `user_id` must own the agent.
    async fn authorize(&self, user_id: Option<&str>, agent_id: &str) -> Result<()> {
        let Some(owner) = self.require_agent(agent_id).await? else {
            return Ok(());
        };
        let user_id = user_id.ok_or_else(|| AgentError::Unauthorized("user_id is required".into()))?;
        if owner != user_id {
            return Err(AgentError::Unauthorized(format!(
                "user {} does not own agent {}",
                user_id, agent_id
            )));
        }
        Ok(())
    }

    async fn agent_lock(&self, agent_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.agent_locks.lock().await;
        Arc::clone(locks.entry(agent_id.to_string()).or_default())
    }

    async fn release_agent_lock(&self, agent_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.agent_locks.lock().await;
        drop(lock);
        // only the map's own reference left: nobody is waiting on this agent
        if locks.get(agent_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(agent_id);
        }
    }
}
