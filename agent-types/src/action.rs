//! The `Action` variant a planner emits and the `ToolCall` it may carry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single tool invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call, assigned by the oracle.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded mapping of argument name to value.
    pub arguments: serde_json::Value,
}

/// The kind of one planner-chosen next step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionKind {
    /// Invoke a tool.
    Tool(ToolCall),
    /// Emit text and continue the loop.
    Respond(String),
    /// Emit text and end the run.
    RespondFinal(String),
    /// Transfer control to another agent.
    Handoff {
        /// The text carried with the transfer.
        message: String,
        /// The identifier of the target agent.
        target_agent_id: String,
    },
}

/// A planner-chosen next step, with an opaque metadata bag used to hand
/// state between iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// What this action does.
    pub kind: ActionKind,
    /// Opaque string-keyed metadata, e.g. a cached reasoning structure.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Action {
    /// Construct a `tool` action.
    #[must_use]
    pub fn tool(call: ToolCall) -> Self {
        Self {
            kind: ActionKind::Tool(call),
            metadata: HashMap::new(),
        }
    }

    /// Construct a `respond` action.
    #[must_use]
    pub fn respond(text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Respond(text.into()),
            metadata: HashMap::new(),
        }
    }

    /// Construct a `respond-final` action.
    #[must_use]
    pub fn respond_final(text: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::RespondFinal(text.into()),
            metadata: HashMap::new(),
        }
    }

    /// Construct a `handoff` action.
    #[must_use]
    pub fn handoff(message: impl Into<String>, target_agent_id: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Handoff {
                message: message.into(),
                target_agent_id: target_agent_id.into(),
            },
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry, builder-style.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether this action is terminal for the current agent's run
    /// (`respond-final` or `handoff`, per `spec.md` invariant 5).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            ActionKind::RespondFinal(_) | ActionKind::Handoff { .. }
        )
    }
}
