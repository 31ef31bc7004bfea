//! Response Parser
//!
//! Turns the raw trace of one reasoning run into an ordered step log plus the
//! final answer.
//!
//! Results are paired to steps by call id when both sides carry one. Otherwise
//! a result goes to the first step with the same tool name, no output yet and
//! no conflicting id. Without ids, two same-named calls whose results arrive
//! out of order are mis-paired.

use crate::message::{AgentResponse, ConversationStep, StepOutput};
use crate::trace::TraceMessage;

pub fn parse_trace(trace: &[TraceMessage]) -> AgentResponse {
    let last_text = trace
        .iter()
        .rposition(|m| matches!(m, TraceMessage::AssistantText { .. }));

    let mut steps: Vec<ConversationStep> = Vec::new();
    let mut final_answer = String::new();
    let mut pending_description: Option<String> = None;

    for (idx, message) in trace.iter().enumerate() {
        match message {
            TraceMessage::UserTurn { .. } => {
                pending_description = None;
            }
            TraceMessage::AssistantText { content } => {
                if Some(idx) == last_text {
                    final_answer = content.clone();
                } else {
                    pending_description = Some(content.clone());
                }
            }
            TraceMessage::AssistantToolCall { text, calls } => {
                if text.is_some() {
                    pending_description = text.clone();
                }
                for call in calls {
                    steps.push(ConversationStep {
                        step_label: format!("Step {}", steps.len() + 1),
                        description: pending_description.take(),
                        tool_used: call.name.clone(),
                        input: call.arguments_object(),
                        output: None,
                        call_id: call.id.clone(),
                    });
                }
            }
            TraceMessage::ToolResult { name, call_id, content, .. } => {
                match find_open_step(&mut steps, name, call_id.as_deref()) {
                    Some(step) => step.output = Some(StepOutput::coerce(content)),
                    None => tracing::debug!(tool = %name, "Dropping unmatched tool result"),
                }
            }
        }
    }

    AgentResponse { steps, final_answer }
}

fn find_open_step<'a>(
    steps: &'a mut [ConversationStep],
    name: &str,
    call_id: Option<&str>,
) -> Option<&'a mut ConversationStep> {
    let by_id = call_id.and_then(|id| {
        steps
            .iter()
            .position(|s| s.output.is_none() && s.call_id.as_deref() == Some(id))
    });
    // an id-carrying result never claims a step that has a different id
    let idx = by_id.or_else(|| {
        steps.iter().position(|s| {
            s.output.is_none() && s.tool_used == name && (call_id.is_none() || s.call_id.is_none())
        })
    })?;
    steps.get_mut(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolCall;
    use serde_json::json;

    fn call(name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new(name, args)
    }

    fn result(name: &str, content: &str) -> TraceMessage {
        TraceMessage::ToolResult {
            name: name.into(),
            call_id: None,
            content: content.into(),
            is_error: false,
        }
    }

    fn tool_turn(text: Option<&str>, calls: Vec<ToolCall>) -> TraceMessage {
        TraceMessage::AssistantToolCall {
            text: text.map(String::from),
            calls,
        }
    }

    #[test]
    fn test_single_call_trace() {
        let trace = vec![
            TraceMessage::user("What is 2 + 3?"),
            tool_turn(None, vec![call("add", json!({"a": 2, "b": 3}))]),
            result("add", "5.0"),
            TraceMessage::assistant("It is 5."),
        ];
        let parsed = parse_trace(&trace);
        assert_eq!(parsed.final_answer, "It is 5.");
        assert_eq!(parsed.steps.len(), 1);
        let step = &parsed.steps[0];
        assert_eq!(step.step_label, "Step 1");
        assert_eq!(step.tool_used, "add");
        assert_eq!(json!(step.input), json!({"a": 2, "b": 3}));
        assert_eq!(step.output, Some(StepOutput::Number(5.0)));
        assert!(step.description.is_none());
    }

    #[test]
    fn test_same_tool_pairs_in_call_order() {
        let trace = vec![
            tool_turn(None, vec![call("add", json!({"a": 1, "b": 1}))]),
            result("add", "2"),
            tool_turn(None, vec![call("add", json!({"a": 2, "b": 2}))]),
            result("add", "4"),
            TraceMessage::assistant("done"),
        ];
        let parsed = parse_trace(&trace);
        assert_eq!(parsed.steps[0].output, Some(StepOutput::Number(2.0)));
        assert_eq!(parsed.steps[1].output, Some(StepOutput::Number(4.0)));
        assert_eq!(parsed.steps[1].step_label, "Step 2");
    }

    #[test]
    fn test_descriptions_come_from_preceding_text() {
        let trace = vec![
            TraceMessage::user("q"),
            TraceMessage::assistant("First I will look up the date."),
            tool_turn(None, vec![call("get_current_date", json!({}))]),
            result("get_current_date", "2025-03-01"),
            tool_turn(Some("Now the time."), vec![call("get_current_time", json!({})), call("add", json!({}))]),
            result("get_current_time", "10:00:00"),
            result("add", "Error: Tool validation error: Missing required parameter: a"),
            TraceMessage::assistant("It is 10:00 on 2025-03-01."),
        ];
        let parsed = parse_trace(&trace);
        assert_eq!(parsed.steps[0].description.as_deref(), Some("First I will look up the date."));
        assert_eq!(parsed.steps[0].output, Some(StepOutput::Text("2025-03-01".into())));
        assert_eq!(parsed.steps[1].description.as_deref(), Some("Now the time."));
        assert!(parsed.steps[2].description.is_none());
        assert!(parsed.steps[2].output.as_ref().unwrap().as_text().unwrap().starts_with("Error:"));
        assert_eq!(parsed.final_answer, "It is 10:00 on 2025-03-01.");
    }

    #[test]
    fn test_no_final_text_yields_empty_answer() {
        let trace = vec![
            tool_turn(None, vec![call("add", json!({"a": 1, "b": 2}))]),
            result("add", "3"),
        ];
        let parsed = parse_trace(&trace);
        assert_eq!(parsed.final_answer, "");
        assert_eq!(parsed.steps.len(), 1);
    }

    #[test]
    fn test_unmatched_result_is_dropped() {
        let trace = vec![result("multiply", "35"), TraceMessage::assistant("ok")];
        let parsed = parse_trace(&trace);
        assert!(parsed.steps.is_empty());
        assert_eq!(parsed.final_answer, "ok");
    }

    #[test]
    fn test_call_ids_override_name_order() {
        let trace = vec![
            tool_turn(
                None,
                vec![
                    call("add", json!({"a": 1, "b": 1})).with_id("c1"),
                    call("add", json!({"a": 5, "b": 5})).with_id("c2"),
                ],
            ),
            TraceMessage::ToolResult {
                name: "add".into(),
                call_id: Some("c2".into()),
                content: "10".into(),
                is_error: false,
            },
            TraceMessage::ToolResult {
                name: "add".into(),
                call_id: Some("c1".into()),
                content: "2".into(),
                is_error: false,
            },
        ];
        let parsed = parse_trace(&trace);
        assert_eq!(parsed.steps[0].output, Some(StepOutput::Number(2.0)));
        assert_eq!(parsed.steps[1].output, Some(StepOutput::Number(10.0)));
    }

    #[test]
    fn test_unknown_id_leaves_other_ids_alone() {
        let trace = vec![
            tool_turn(None, vec![call("add", json!({"a": 1, "b": 1})).with_id("c1")]),
            TraceMessage::ToolResult {
                name: "add".into(),
                call_id: Some("zz".into()),
                content: "99".into(),
                is_error: false,
            },
            tool_turn(None, vec![call("add", json!({"a": 2, "b": 2}))]),
            TraceMessage::ToolResult {
                name: "add".into(),
                call_id: Some("zz".into()),
                content: "4".into(),
                is_error: false,
            },
        ];
        let parsed = parse_trace(&trace);
        // first result matched nothing; the second lands on the id-less step
        assert_eq!(parsed.steps[0].output, None);
        assert_eq!(parsed.steps[1].output, Some(StepOutput::Number(4.0)));
    }

    #[test]
    fn test_user_turn_clears_pending_description() {
        let trace = vec![
            TraceMessage::assistant("old answer"),
            TraceMessage::user("new question"),
            tool_turn(None, vec![call("add", json!({"a": 1, "b": 1}))]),
            result("add", "2"),
            TraceMessage::assistant("2"),
        ];
        let parsed = parse_trace(&trace);
        assert!(parsed.steps[0].description.is_none());
    }
}
