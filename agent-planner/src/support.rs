//! Helpers shared by every planner strategy.

use agent_types::{Action, AiMessage, Message, PlannerState};

/// Turn one oracle response into the actions it implies: one `tool` action
/// per attached tool call, or a single `respond-final` action carrying its
/// text if it carried none.
#[must_use]
pub fn parse_ai_response(msg: &AiMessage) -> Vec<Action> {
    if msg.has_tool_calls() {
        msg.tool_calls
            .iter()
            .cloned()
            .map(Action::tool)
            .collect()
    } else {
        vec![Action::respond_final(msg.text.clone())]
    }
}

/// The conversation a strategy should hand the oracle this iteration.
///
/// The executor already rebuilds `state.messages` into initial messages
/// plus expanded tool observations before each `replan` call, so this is a
/// thin, named wrapper kept for parity with the strategies' shared-helper
/// contract rather than a second derivation.
#[must_use]
pub fn build_messages_from_state(state: &PlannerState) -> Vec<Message> {
    state.messages.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::ToolCall;

    #[test]
    fn parses_tool_calls_when_present() {
        let msg = AiMessage::with_tool_calls(
            "",
            vec![ToolCall {
                id: "1".into(),
                name: "echo".into(),
                arguments: serde_json::json!({}),
            }],
        );
        let actions = parse_ai_response(&msg);
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0].kind, agent_types::ActionKind::Tool(_)));
    }

    #[test]
    fn parses_text_as_respond_final_when_no_tool_calls() {
        let msg = AiMessage::text("done");
        let actions = parse_ai_response(&msg);
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0].kind, agent_types::ActionKind::RespondFinal(text) if text == "done"));
    }
}
