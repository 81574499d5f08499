//! Declarative transfer of control to another agent, and the shared
//! execution context tool calls (including handoffs) run under.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;

/// Shared, per-run context passed to every tool (and handoff) execution.
#[derive(Clone)]
pub struct ToolContext {
    /// Cancellation token for this run.
    pub cancellation: CancellationToken,
    /// Arbitrary payload stashed by the run for handoffs to pick up (the
    /// "run's handoff-context key" in `spec.md` §4.3).
    pub handoff_context: serde_json::Value,
}

impl ToolContext {
    /// Construct a new context with no handoff payload.
    #[must_use]
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            handoff_context: serde_json::Value::Null,
        }
    }
}

/// The input a handoff tool builds for its target agent.
#[derive(Debug, Clone, Default)]
pub struct HandoffInput {
    /// The message text the calling oracle supplied.
    pub message: String,
    /// The run's handoff-context payload, unfiltered.
    pub context: serde_json::Value,
}

/// A recursively invocable agent, as seen by the handoff-as-tool adapter.
///
/// Implemented by the top-level `Agent` facade in `agent-core`; declared
/// here (rather than depended on) so `agent-tool` need not depend on
/// `agent-core`, avoiding a cycle.
#[async_trait]
pub trait AgentHandle: Send + Sync {
    /// This agent's identifier (used to name its synthetic
    /// `transfer_to_<id>` tool).
    fn id(&self) -> &str;

    /// Invoke this agent on its text path and return its final answer.
    async fn invoke_text(&self, input: HandoffInput, ctx: &ToolContext) -> Result<String, ToolError>;
}

type InputFilterFn = Arc<dyn Fn(HandoffInput) -> HandoffInput + Send + Sync>;
type IsEnabledFn = Arc<dyn Fn(&ToolContext) -> bool + Send + Sync>;
type OnHandoffFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ToolError>> + Send + 'a>>;
type OnHandoffFn = Arc<dyn for<'a> Fn(&'a ToolContext) -> OnHandoffFuture<'a> + Send + Sync>;

/// A declarative descriptor for transferring the conversation to another
/// agent, projected by the core into a synthetic tool named
/// `transfer_to_<target_id>`.
#[derive(Clone)]
pub struct Handoff {
    /// The agent this handoff transfers control to.
    pub target: Arc<dyn AgentHandle>,
    /// Overrides the default `"Transfer the conversation to <target_id>."`
    /// tool description.
    pub description: Option<String>,
    /// Transforms the `HandoffInput` before it reaches the target agent.
    pub input_filter: Option<InputFilterFn>,
    /// Fired just before dispatch; an error here aborts the handoff.
    pub on_handoff: Option<OnHandoffFn>,
    /// Gate checked before dispatch; `false` fails the handoff with
    /// [`ToolError::HandoffDisabled`].
    pub is_enabled: Option<IsEnabledFn>,
}

impl Handoff {
    /// Construct a handoff with no guards or filters.
    #[must_use]
    pub fn new(target: Arc<dyn AgentHandle>) -> Self {
        Self {
            target,
            description: None,
            input_filter: None,
            on_handoff: None,
            is_enabled: None,
        }
    }

    /// Override the tool description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an input filter.
    #[must_use]
    pub fn with_input_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(HandoffInput) -> HandoffInput + Send + Sync + 'static,
    {
        self.input_filter = Some(Arc::new(filter));
        self
    }

    /// Attach an `is_enabled` gate.
    #[must_use]
    pub fn with_is_enabled<F>(mut self, gate: F) -> Self
    where
        F: Fn(&ToolContext) -> bool + Send + Sync + 'static,
    {
        self.is_enabled = Some(Arc::new(gate));
        self
    }

    /// The synthetic tool name this handoff projects to:
    /// `transfer_to_<target_id>`.
    #[must_use]
    pub fn tool_name(&self) -> String {
        format!("transfer_to_{}", self.target.id())
    }

    /// The tool description, defaulted if none was supplied.
    #[must_use]
    pub fn tool_description(&self) -> String {
        self.description.clone().unwrap_or_else(|| {
            format!("Transfer the conversation to {}.", self.target.id())
        })
    }
}

/// The exact `transfer_to_` prefix synthetic handoff tools are named with.
pub const HANDOFF_TOOL_PREFIX: &str = "transfer_to_";

/// Whether a tool call name matches the handoff-tool naming contract.
#[must_use]
pub fn is_handoff_tool(name: &str) -> bool {
    name.len() > HANDOFF_TOOL_PREFIX.len() && name.starts_with(HANDOFF_TOOL_PREFIX)
}

/// Extract the target agent id from a handoff tool's name, bytewise.
#[must_use]
pub fn handoff_target_id(name: &str) -> Option<&str> {
    if is_handoff_tool(name) {
        Some(&name[HANDOFF_TOOL_PREFIX.len()..])
    } else {
        None
    }
}
