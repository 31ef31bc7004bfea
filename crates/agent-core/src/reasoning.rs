//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern for agent behavior.
//! The model observes the window, requests tools, sees their results, and
//! repeats until it answers without requesting anything further.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::error::{AgentError, Result};
use crate::provider::{ChatModel, ChatRequest};
use crate::tool::{RunContext, ToolSet};
use crate::trace::TraceMessage;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System instruction sent with every step
    pub system_prompt: String,

    /// Maximum model steps before the run is cut off
    pub max_steps: usize,

    /// Deadline for a single model call
    pub step_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_steps: 10,
            step_timeout: Duration::from_secs(120),
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \n\n\
You have access to specialized tools to help you answer the question. \n\n\
You don't need to specify that you used a tool, just answer the question. \
Never assume the current date or time, use the tools to get the current date and time. \
Always write your answer in markdown format and use bullet points and numbered lists when appropriate.";

/// Raw outcome of one run
#[derive(Clone, Debug)]
pub struct RunTrace {
    /// The new question followed by every message the run produced
    pub messages: Vec<TraceMessage>,

    /// Model steps taken
    pub steps_taken: usize,

    /// Whether the step cap ended the run
    pub hit_step_limit: bool,
}

/// The main Agent struct
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolSet,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolSet, config: AgentConfig) -> Self {
        Self { model, tools, config }
    }

    /// Run over an assembled window whose last message is the new question.
    ///
    /// Tool failures are fed back to the model as error results. A failed or
    /// timed-out model step aborts the run with [`AgentError::RunFailed`].
    pub async fn run(&self, window: Vec<TraceMessage>, ctx: &RunContext) -> Result<RunTrace> {
        let run_start = window.len().saturating_sub(1);
        let mut conversation = window;
        let schemas = self.tools.schemas();
        let mut steps_taken = 0;

        loop {
            if steps_taken >= self.config.max_steps {
                tracing::warn!(
                    model = %self.model.model_name(),
                    max_steps = self.config.max_steps,
                    "Step limit reached, returning partial trace"
                );
                return Ok(RunTrace {
                    messages: conversation.split_off(run_start),
                    steps_taken,
                    hit_step_limit: true,
                });
            }
            steps_taken += 1;

            let request = ChatRequest {
                system: Some(self.config.system_prompt.clone()),
                messages: conversation.clone(),
                tools: schemas.clone(),
            };

            tracing::debug!(step = steps_taken, model = %self.model.model_name(), "Invoking model");
            let completion = tokio::time::timeout(self.config.step_timeout, self.model.complete(&request))
                .await
                .map_err(|_| AgentError::run_failed(AgentError::Timeout(self.config.step_timeout.as_secs())))?
                .map_err(AgentError::run_failed)?;

            let calls = completion.tool_calls.clone();
            conversation.push(completion.into_trace());

            if calls.is_empty() {
                return Ok(RunTrace {
                    messages: conversation.split_off(run_start),
                    steps_taken,
                    hit_step_limit: false,
                });
            }

            for call in &calls {
                tracing::debug!(step = steps_taken, tool = %call.name, "Executing tool");
            }
            let results = join_all(calls.iter().map(|call| self.tools.execute(call, ctx))).await;
            conversation.extend(results.iter().map(TraceMessage::from_tool_result));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedModel;
    use crate::provider::Completion;
    use crate::tool::{Tool, ToolCall, ToolResult, ToolSchema};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the agent id".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _call: &ToolCall, ctx: &RunContext) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", ctx.agent_id.clone().unwrap_or_default()))
        }
    }

    fn agent(model: ScriptedModel, max_steps: usize) -> Agent {
        let config = AgentConfig {
            max_steps,
            step_timeout: Duration::from_secs(5),
            ..Default::default()
        };
        Agent::new(Arc::new(model), ToolSet::new(vec![Arc::new(Echo)]), config)
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let model = ScriptedModel::new().then_text("Hello!");
        let trace = agent(model, 3)
            .run(vec![TraceMessage::user("Hi")], &RunContext::default())
            .await
            .unwrap();
        assert_eq!(trace.steps_taken, 1);
        assert!(!trace.hit_step_limit);
        assert_eq!(trace.messages, vec![TraceMessage::user("Hi"), TraceMessage::assistant("Hello!")]);
    }

    #[tokio::test]
    async fn test_tool_round_trip_uses_context() {
        let model = ScriptedModel::new()
            .then_tools(vec![ToolCall::new("echo", serde_json::json!({})), ToolCall::new("missing", serde_json::json!({}))])
            .then_text("done");
        let handle = model.clone();
        let ctx = RunContext::new(Some("u1".into()), Some("agent-7".into()));
        let trace = agent(model, 5)
            .run(vec![TraceMessage::assistant("earlier"), TraceMessage::user("go")], &ctx)
            .await
            .unwrap();

        assert_eq!(trace.messages.len(), 5);
        assert_eq!(trace.messages[0], TraceMessage::user("go"));
        match &trace.messages[2] {
            TraceMessage::ToolResult { name, content, is_error, .. } => {
                assert_eq!(name, "echo");
                assert_eq!(content, "agent-7");
                assert!(!is_error);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &trace.messages[3] {
            TraceMessage::ToolResult { content, is_error, .. } => {
                assert!(is_error);
                assert!(content.contains("Tool not found: missing"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let requests = handle.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[1].messages.len(), 5);
        assert!(requests[0].system.as_deref().unwrap().contains("Never assume the current date"));
    }

    #[tokio::test]
    async fn test_step_limit_returns_partial_trace() {
        let model = ScriptedModel::new()
            .then_tools(vec![ToolCall::new("echo", serde_json::json!({}))])
            .then_tools(vec![ToolCall::new("echo", serde_json::json!({}))]);
        let trace = agent(model, 1)
            .run(vec![TraceMessage::user("loop")], &RunContext::default())
            .await
            .unwrap();
        assert!(trace.hit_step_limit);
        assert_eq!(trace.steps_taken, 1);
        assert_eq!(trace.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_model_failure_aborts_run() {
        let model = ScriptedModel::new().then_error(AgentError::ProviderUnavailable("down".into()));
        let err = agent(model, 3)
            .run(vec![TraceMessage::user("q")], &RunContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RunFailed(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_hung_model_times_out() {
        let model = ScriptedModel::new()
            .with_delay(Duration::from_millis(200))
            .then_completion(Completion::text("m", "late"));
        let config = AgentConfig {
            step_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let agent = Agent::new(Arc::new(model), ToolSet::default(), config);
        let err = agent
            .run(vec![TraceMessage::user("q")], &RunContext::default())
            .await
            .unwrap_err();
        match err {
            AgentError::RunFailed(cause) => assert!(matches!(*cause, AgentError::Timeout(_))),
            other => panic!("unexpected {other:?}"),
        }
    }
}
