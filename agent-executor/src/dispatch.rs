//! Action dispatch: one `Action` in, one `Observation` plus the `Event`s it
//! produced out (`spec.md` §4.1.1).

use std::time::Instant;

use agent_hooks::Hooks;
use agent_tool::ToolRegistry;
use agent_types::{Action, ActionKind, Event, HookError, Observation, ToolContext, ToolResult};

/// One action's dispatch outcome: the `Observation` to append to the run's
/// state, and the `Event`s it produced, in emission order.
pub struct DispatchOutcome {
    /// The observation to append to `PlannerState.observations`.
    pub observation: Observation,
    /// Events emitted while dispatching, in order.
    pub events: Vec<Event>,
}

/// Dispatch one action. The only failure mode is a hook callback returning
/// an error, which is fatal to the run per `spec.md`'s failure semantics;
/// tool failures are folded into the observation instead of propagated.
#[tracing::instrument(skip_all, fields(agent_id = %agent_id))]
pub async fn dispatch(
    action: &Action,
    agent_id: &str,
    tools: &ToolRegistry,
    ctx: &ToolContext,
    hooks: &Hooks,
) -> Result<DispatchOutcome, HookError> {
    let start = Instant::now();

    match &action.kind {
        ActionKind::Tool(call) => {
            let mut events = vec![Event::ToolCall {
                agent_id: agent_id.to_string(),
                call: call.clone(),
            }];
            hooks.fire_on_tool_call(call).await?;

            let result = match tools.get(&call.name) {
                Ok(tool) => match tool.execute(call.arguments.clone(), ctx).await {
                    Ok(result) => result,
                    Err(err) => ToolResult::error(err.to_string()),
                },
                Err(err) => ToolResult::error(err.to_string()),
            };

            hooks.fire_on_tool_result(&result).await?;
            events.push(Event::ToolResult {
                agent_id: agent_id.to_string(),
                tool_call_id: call.id.clone(),
                result: result.clone(),
            });

            let observation = Observation::new(action.clone(), start.elapsed()).with_result(result);
            Ok(DispatchOutcome { observation, events })
        }

        ActionKind::Respond(text) | ActionKind::RespondFinal(text) => {
            let events = vec![Event::Text {
                agent_id: agent_id.to_string(),
                text: text.clone(),
            }];
            let observation = Observation::new(action.clone(), start.elapsed());
            Ok(DispatchOutcome { observation, events })
        }

        ActionKind::Handoff { message, target_agent_id } => {
            let events = vec![Event::Handoff {
                agent_id: agent_id.to_string(),
                target_agent_id: target_agent_id.clone(),
                message: message.clone(),
            }];
            let observation = Observation::new(action.clone(), start.elapsed());
            Ok(DispatchOutcome { observation, events })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tool::Tool;
    use agent_types::{ToolCall, ToolError};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes input"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<ToolResult, ToolError> {
            let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
            Ok(ToolResult::text(format!("echoed: {text}")))
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(CancellationToken::new())
    }

    #[tokio::test]
    async fn tool_dispatch_emits_call_then_result() {
        let mut registry = ToolRegistry::new();
        registry.add(std::sync::Arc::new(EchoTool));
        let call = ToolCall {
            id: "c1".into(),
            name: "echo".into(),
            arguments: json!({"text": "hi"}),
        };
        let outcome = dispatch(&Action::tool(call), "agent-a", &registry, &ctx(), &Hooks::default())
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 2);
        assert!(matches!(&outcome.events[0], Event::ToolCall { .. }));
        assert!(matches!(&outcome.events[1], Event::ToolResult { result, .. } if result.first_text() == Some("echoed: hi")));
        assert_eq!(outcome.observation.result.unwrap().first_text(), Some("echoed: hi"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result_not_failure() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            id: "c1".into(),
            name: "missing".into(),
            arguments: json!({}),
        };
        let outcome = dispatch(&Action::tool(call), "agent-a", &registry, &ctx(), &Hooks::default())
            .await
            .unwrap();
        assert!(matches!(&outcome.events[1], Event::ToolResult { result, .. } if result.is_error));
        assert!(outcome.observation.result.unwrap().is_error);
    }

    #[tokio::test]
    async fn respond_final_emits_text_event() {
        let registry = ToolRegistry::new();
        let outcome = dispatch(&Action::respond_final("done"), "agent-a", &registry, &ctx(), &Hooks::default())
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert!(matches!(&outcome.events[0], Event::Text { text, .. } if text == "done"));
    }

    #[tokio::test]
    async fn handoff_emits_handoff_event_with_target() {
        let registry = ToolRegistry::new();
        let outcome = dispatch(
            &Action::handoff("help", "billing"),
            "agent-a",
            &registry,
            &ctx(),
            &Hooks::default(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert!(matches!(&outcome.events[0], Event::Handoff { target_agent_id, .. } if target_agent_id == "billing"));
    }

    #[tokio::test]
    async fn failing_tool_hook_aborts_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.add(std::sync::Arc::new(EchoTool));
        let hooks = Hooks {
            on_tool_call: Some(std::sync::Arc::new(|_call| {
                Box::pin(async { Err(HookError::Failed("denied".into())) })
            })),
            ..Default::default()
        };
        let call = ToolCall {
            id: "c1".into(),
            name: "echo".into(),
            arguments: json!({}),
        };
        let err = dispatch(&Action::tool(call), "agent-a", &registry, &ctx(), &hooks)
            .await
            .unwrap_err();
        assert!(matches!(err, HookError::Failed(_)));
    }
}
