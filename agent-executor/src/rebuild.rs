//! Message rebuild: initial messages plus tool observations expanded to
//! ⟨ai-with-tool-call, tool-result⟩ pairs (`spec.md` §4.1.2).

use agent_types::{ActionKind, Message, Observation};

/// Rebuild the conversation the next Plan/Replan call should see.
///
/// Only tool observations contribute. Each contributes an `ai` message
/// carrying its original tool call, then a `tool` message referencing that
/// call's id whose text is the result's joined text parts, or the
/// stringified dispatch error if no result was produced.
#[must_use]
pub fn rebuild_messages(initial_messages: &[Message], observations: &[Observation]) -> Vec<Message> {
    let mut messages = initial_messages.to_vec();
    for observation in observations {
        let ActionKind::Tool(call) = &observation.action.kind else {
            continue;
        };
        messages.push(Message::ai_with_tool_calls(String::new(), vec![call.clone()]));
        let text = match (&observation.result, &observation.error) {
            (Some(result), _) => result.joined_text(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        messages.push(Message::tool_result(call.id.clone(), text));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::{Action, Role, ToolCall, ToolResult};
    use std::time::Duration;

    fn call(id: &str) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hi"}),
        }
    }

    #[test]
    fn non_tool_observations_contribute_nothing() {
        let initial = vec![Message::human("hi")];
        let obs = vec![Observation::new(Action::respond_final("done"), Duration::ZERO)];
        let rebuilt = rebuild_messages(&initial, &obs);
        assert_eq!(rebuilt.len(), 1);
    }

    #[test]
    fn tool_observation_expands_to_ai_and_tool_pair() {
        let initial = vec![Message::human("hi")];
        let obs = vec![Observation::new(Action::tool(call("c1")), Duration::ZERO)
            .with_result(ToolResult::text("echoed: hi"))];
        let rebuilt = rebuild_messages(&initial, &obs);
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(rebuilt[1].role, Role::Ai);
        assert_eq!(rebuilt[1].tool_calls[0].id, "c1");
        assert_eq!(rebuilt[2].role, Role::Tool);
        assert_eq!(rebuilt[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(rebuilt[2].text, "echoed: hi");
    }

    #[test]
    fn missing_result_falls_back_to_stringified_error() {
        let obs = vec![Observation::new(Action::tool(call("c1")), Duration::ZERO)
            .with_error("tool not found: echo")];
        let rebuilt = rebuild_messages(&[], &obs);
        assert_eq!(rebuilt[1].text, "tool not found: echo");
    }

    #[test]
    fn multiple_tool_observations_append_in_order() {
        let obs = vec![
            Observation::new(Action::tool(call("c1")), Duration::ZERO).with_result(ToolResult::text("a")),
            Observation::new(Action::tool(call("c2")), Duration::ZERO).with_result(ToolResult::text("b")),
        ];
        let rebuilt = rebuild_messages(&[], &obs);
        assert_eq!(rebuilt.len(), 4);
        assert_eq!(rebuilt[1].tool_calls[0].id, "c1");
        assert_eq!(rebuilt[3].tool_calls[0].id, "c2");
    }
}
