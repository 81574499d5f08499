//! Projects a [`Handoff`] descriptor into a synthetic [`Tool`].

use async_trait::async_trait;
use serde_json::{json, Value};

use agent_types::{Handoff, HandoffInput, ToolContext, ToolError, ToolResult};

use crate::registry::Tool;

/// A synthetic tool, named `transfer_to_<target_id>`, that dispatches to a
/// [`Handoff`]'s target agent when called.
pub struct HandoffTool {
    name: String,
    description: String,
    handoff: Handoff,
}

impl HandoffTool {
    /// Wrap a handoff descriptor as a tool.
    #[must_use]
    pub fn new(handoff: Handoff) -> Self {
        Self {
            name: handoff.tool_name(),
            description: handoff.tool_description(),
            handoff,
        }
    }
}

#[async_trait]
impl Tool for HandoffTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to hand off to the target agent.",
                }
            },
            "required": ["message"],
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if let Some(gate) = &self.handoff.is_enabled {
            if !gate(ctx) {
                return Ok(ToolResult::error(format!(
                    "handoff to {} is disabled",
                    self.handoff.target.id()
                )));
            }
        }

        if let Some(on_handoff) = &self.handoff.on_handoff {
            on_handoff(ctx).await?;
        }

        let message = args
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("missing \"message\" field".into()))?
            .to_string();

        let mut input = HandoffInput {
            message,
            context: ctx.handoff_context.clone(),
        };
        if let Some(filter) = &self.handoff.input_filter {
            input = filter(input);
        }

        match self.handoff.target.invoke_text(input, ctx).await {
            Ok(text) => Ok(ToolResult::text(text)),
            Err(err) => Ok(ToolResult::error(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use agent_types::AgentHandle;
    use tokio_util::sync::CancellationToken;

    struct StubAgent {
        id: String,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentHandle for StubAgent {
        fn id(&self) -> &str {
            &self.id
        }

        async fn invoke_text(&self, input: HandoffInput, _ctx: &ToolContext) -> Result<String, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ToolError::ExecutionFailed("target unavailable".into()))
            } else {
                Ok(format!("handled: {}", input.message))
            }
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(CancellationToken::new())
    }

    #[test]
    fn tool_name_matches_handoff_convention() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let tool = HandoffTool::new(Handoff::new(target));
        assert_eq!(tool.name(), "transfer_to_billing");
    }

    #[tokio::test]
    async fn execute_dispatches_to_target_and_wraps_success() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let tool = HandoffTool::new(Handoff::new(target));
        let result = tool
            .execute(json!({"message": "refund please"}), &ctx())
            .await
            .unwrap();
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some("handled: refund please"));
    }

    #[tokio::test]
    async fn execute_wraps_target_failure_as_error_result() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let tool = HandoffTool::new(Handoff::new(target));
        let result = tool
            .execute(json!({"message": "refund please"}), &ctx())
            .await
            .unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn execute_rejects_missing_message_field() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let tool = HandoffTool::new(Handoff::new(target));
        let err = tool.execute(json!({}), &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn disabled_handoff_short_circuits_without_calling_target() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let handoff = Handoff::new(target.clone()).with_is_enabled(|_ctx| false);
        let tool = HandoffTool::new(handoff);
        let result = tool
            .execute(json!({"message": "refund please"}), &ctx())
            .await
            .unwrap();
        assert!(result.is_error);
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn input_filter_runs_before_dispatch() {
        let seen = Arc::new(std::sync::Mutex::new(String::new()));
        let seen_clone = seen.clone();
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let handoff = Handoff::new(target).with_input_filter(move |mut input| {
            *seen_clone.lock().unwrap() = input.message.clone();
            input.message = format!("[filtered] {}", input.message);
            input
        });
        let tool = HandoffTool::new(handoff);
        let result = tool
            .execute(json!({"message": "refund please"}), &ctx())
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), "refund please");
        assert_eq!(result.first_text(), Some("handled: [filtered] refund please"));
    }

    #[tokio::test]
    async fn on_handoff_failure_propagates_as_tool_error() {
        let target = Arc::new(StubAgent {
            id: "billing".into(),
            fail: false,
            calls: AtomicUsize::new(0),
        });
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = fired.clone();
        let handoff = Handoff::new(target.clone()).with_description("x");
        let mut handoff = handoff;
        handoff.on_handoff = Some(Arc::new(move |_ctx| {
            fired_clone.store(true, Ordering::SeqCst);
            Box::pin(async { Err(ToolError::ExecutionFailed("notify failed".into())) })
        }));
        let tool = HandoffTool::new(handoff);
        let err = tool
            .execute(json!({"message": "refund please"}), &ctx())
            .await
            .unwrap_err();
        assert!(fired.load(Ordering::SeqCst));
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
