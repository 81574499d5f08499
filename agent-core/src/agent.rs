//! [`Agent`]: the facade over a configured [`Executor`] run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use agent_executor::Executor;
use agent_hooks::Hooks;
use agent_tool::ToolRegistry;
use agent_types::{
    AgentHandle, Event, ExecError, HandoffInput, Memory, Message, Persona, ToolContext, ToolError,
};

/// A configured agent: a planner bound to an oracle and strategy, its tool
/// set (including any handoffs, raw or child-derived), persona, hooks, and
/// seed metadata.
///
/// Constructed only via [`crate::AgentBuilder::build`]. Exposes the run
/// entry points described in `spec.md` §5 (`Invoke`, `Stream`) and
/// implements [`AgentHandle`] so it can itself be a handoff target.
pub struct Agent {
    id: String,
    executor: Executor,
    tools: ToolRegistry,
    persona: Persona,
    hooks: Hooks,
    initial_metadata: HashMap<String, serde_json::Value>,
    memory: Option<Arc<dyn Memory>>,
}

impl Agent {
    pub(crate) fn new(
        id: String,
        executor: Executor,
        tools: ToolRegistry,
        persona: Persona,
        hooks: Hooks,
        initial_metadata: HashMap<String, serde_json::Value>,
        memory: Option<Arc<dyn Memory>>,
    ) -> Self {
        Self {
            id,
            executor,
            tools,
            persona,
            hooks,
            initial_metadata,
            memory,
        }
    }

    /// This agent's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This agent's tool registry, including any handoffs projected into
    /// synthetic tools at build time.
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The metadata this agent's runs are seeded with.
    #[must_use]
    pub fn initial_metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.initial_metadata
    }

    /// The memory collaborator this agent was built with, if any. The core
    /// never reads or writes it; an embedder loads history into `Stream`'s
    /// `initial_messages` and persists new turns after the run itself.
    #[must_use]
    pub fn memory(&self) -> Option<&Arc<dyn Memory>> {
        self.memory.as_ref()
    }

    fn seed_messages(&self, input: &str) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(system) = self.persona.render() {
            messages.push(system);
        }
        messages.push(Message::human(input));
        messages
    }

    /// Run this agent on `input`, yielding [`Event`]s as they are produced.
    ///
    /// Exactly one terminal event (`Done`, `Error`, or a terminal `Handoff`)
    /// ends the stream; nothing follows it.
    pub fn stream(
        &self,
        input: impl Into<String>,
        cancellation: CancellationToken,
    ) -> impl Stream<Item = Event> + Send + 'static {
        let input = input.into();
        let initial_messages = self.seed_messages(&input);
        self.executor.run_with_metadata(
            input,
            self.id.clone(),
            self.tools.clone(),
            initial_messages,
            self.hooks.clone(),
            cancellation,
            self.initial_metadata.clone(),
        )
    }

    /// Run this agent on `input` to completion and return its final answer.
    ///
    /// # Errors
    /// Returns [`ExecError::Planner`] if the run ended on an `Error` event
    /// (the planner/oracle/hook failure is embedded in the message), or
    /// [`ExecError::Cancelled`] if the run ended on a terminal `Handoff`
    /// without ever reaching `Done` — `invoke` has no conversational target
    /// to resume on behalf of the caller, so a bare handoff is reported as
    /// an incomplete run rather than synthesizing an answer.
    pub async fn invoke(&self, input: impl Into<String>, cancellation: CancellationToken) -> Result<String, ExecError> {
        let stream = self.stream(input, cancellation);
        tokio::pin!(stream);

        let mut last_handoff_target: Option<String> = None;
        while let Some(event) = stream.next().await {
            match event {
                Event::Done { text, .. } => return Ok(text),
                Event::Error { message, .. } => {
                    return Err(ExecError::Planner(agent_types::PlannerError::Other(
                        message.into(),
                    )))
                }
                Event::Handoff { target_agent_id, .. } => {
                    last_handoff_target = Some(target_agent_id);
                }
                _ => {}
            }
        }

        match last_handoff_target {
            Some(target) => Err(ExecError::Cancelled(format!(
                "run handed off to {target} without a final answer"
            ))),
            None => Err(ExecError::Cancelled(
                "run ended with no terminal event".to_string(),
            )),
        }
    }
}

#[async_trait]
impl AgentHandle for Agent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke_text(&self, input: HandoffInput, ctx: &ToolContext) -> Result<String, ToolError> {
        let cancellation = ctx.cancellation.child_token();
        self.invoke(input.message, cancellation)
            .await
            .map_err(|err| ToolError::ExecutionFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AgentBuilder;
    use agent_types::testing::ScriptedOracle;
    use agent_types::Oracle;

    #[tokio::test]
    async fn invoke_returns_final_text() {
        let oracle: Arc<dyn Oracle> = Arc::new(ScriptedOracle::with_texts(["hello there"]));
        let agent = AgentBuilder::new("a").with_llm(oracle).build().unwrap();
        let text = agent.invoke("hi", CancellationToken::new()).await.unwrap();
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn invoke_surfaces_planner_error() {
        struct FailingOracle;
        #[async_trait]
        impl Oracle for FailingOracle {
            async fn generate(&self, _messages: &[Message]) -> Result<agent_types::AiMessage, agent_types::OracleError> {
                Err(agent_types::OracleError("boom".into()))
            }
            fn bind_tools(&self, _tools: Vec<agent_types::ToolDefinition>) -> Arc<dyn Oracle> {
                Arc::new(FailingOracle)
            }
        }
        let agent = AgentBuilder::new("a").with_llm(Arc::new(FailingOracle)).build().unwrap();
        let err = agent.invoke("hi", CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExecError::Planner(_)));
    }

    #[tokio::test]
    async fn invoke_reports_bare_handoff_as_cancelled() {
        struct HandoffOracle;
        #[async_trait]
        impl Oracle for HandoffOracle {
            async fn generate(&self, _messages: &[Message]) -> Result<agent_types::AiMessage, agent_types::OracleError> {
                unreachable!("handoff planner below does not call the oracle")
            }
            fn bind_tools(&self, _tools: Vec<agent_types::ToolDefinition>) -> Arc<dyn Oracle> {
                Arc::new(HandoffOracle)
            }
        }

        struct HandoffPlanner;
        #[async_trait]
        impl agent_planner::Planner for HandoffPlanner {
            async fn plan(
                &self,
                _state: &agent_types::PlannerState,
            ) -> Result<Vec<agent_types::Action>, agent_types::PlannerError> {
                Ok(vec![agent_types::Action::handoff("help please", "billing")])
            }
        }

        let agent = AgentBuilder::new("a")
            .with_planner(Arc::new(HandoffPlanner))
            .build()
            .unwrap();
        let err = agent.invoke("hi", CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ExecError::Cancelled(msg) if msg.contains("billing")));
    }

    #[tokio::test]
    async fn agent_as_handoff_target_dispatches_through_invoke_text() {
        let oracle: Arc<dyn Oracle> = Arc::new(ScriptedOracle::with_texts(["handled"]));
        let agent = AgentBuilder::new("billing").with_llm(oracle).build().unwrap();
        let ctx = ToolContext::new(CancellationToken::new());
        let text = agent
            .invoke_text(
                HandoffInput {
                    message: "refund".into(),
                    context: serde_json::Value::Null,
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(text, "handled");
    }
}
