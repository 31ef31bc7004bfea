//! Run Trace
//!
//! The heterogeneous message sequence a reasoning run exchanges with the model.
//! Vendor adapters translate it to their wire format; the response parser
//! walks it to build the step log.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};
use crate::tool::{ToolCall, ToolResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceMessage {
    /// A user turn, replayed from history or the new question
    UserTurn { content: String },

    /// Assistant free text with no tool call attached
    AssistantText { content: String },

    /// Assistant turn requesting one or more tools, optionally preceded by text
    AssistantToolCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolCall>,
    },

    /// Result of one tool invocation fed back to the model
    ToolResult {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl TraceMessage {
    pub fn user(content: impl Into<String>) -> Self {
        TraceMessage::UserTurn { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        TraceMessage::AssistantText { content: content.into() }
    }

    /// Assistant turn from model output; empty text with no calls is still a (blank) answer.
    pub fn from_model_output(text: String, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            TraceMessage::AssistantText { content: text }
        } else {
            let text = Some(text).filter(|t| !t.trim().is_empty());
            TraceMessage::AssistantToolCall { text, calls }
        }
    }

    /// Map a persisted history record; unrecognized roles yield `None`.
    pub fn from_history(message: &Message) -> Option<Self> {
        match message.role {
            Role::User => Some(Self::user(message.content.clone())),
            Role::Assistant => Some(Self::assistant(message.content.clone())),
            Role::Unknown => None,
        }
    }

    pub fn from_tool_result(result: &ToolResult) -> Self {
        TraceMessage::ToolResult {
            name: result.name.clone(),
            call_id: result.id.clone(),
            content: result.output.clone(),
            is_error: !result.success,
        }
    }

    /// Plain text carried by the message, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            TraceMessage::UserTurn { content }
            | TraceMessage::AssistantText { content }
            | TraceMessage::ToolResult { content, .. } => Some(content),
            TraceMessage::AssistantToolCall { text, .. } => text.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_model_output_without_calls_is_text() {
        let msg = TraceMessage::from_model_output("Done.".into(), vec![]);
        assert_eq!(msg, TraceMessage::assistant("Done."));
    }

    #[test]
    fn test_model_output_drops_blank_preamble() {
        let call = ToolCall {
            name: "add".into(),
            arguments: HashMap::new(),
            id: None,
        };
        let msg = TraceMessage::from_model_output("  ".into(), vec![call]);
        match msg {
            TraceMessage::AssistantToolCall { text, calls } => {
                assert!(text.is_none());
                assert_eq!(calls.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_history_role_is_dropped() {
        let mut msg = Message::user("hello");
        msg.role = Role::Unknown;
        assert!(TraceMessage::from_history(&msg).is_none());
    }
}
