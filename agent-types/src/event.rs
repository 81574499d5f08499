//! What the executor emits to callers as it drives a run.

use serde::{Deserialize, Serialize};

use crate::action::ToolCall;
use crate::observation::ToolResult;

/// What the executor emits to callers.
///
/// Exactly one terminal event (`Done` or `Error`) is emitted per run, and
/// no events follow it (`spec.md` invariant 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Text produced by a `respond` or `respond-final` action.
    Text {
        /// The emitting agent's identifier.
        agent_id: String,
        /// The text.
        text: String,
    },
    /// A tool is about to be invoked.
    ToolCall {
        /// The emitting agent's identifier.
        agent_id: String,
        /// The call being made.
        call: ToolCall,
    },
    /// A tool call returned.
    ToolResult {
        /// The emitting agent's identifier.
        agent_id: String,
        /// The id of the `ToolCall` this result answers.
        tool_call_id: String,
        /// The result.
        result: ToolResult,
    },
    /// Control is transferring to another agent.
    Handoff {
        /// The emitting (outgoing) agent's identifier.
        agent_id: String,
        /// The identifier of the target agent.
        target_agent_id: String,
        /// The text carried with the transfer.
        message: String,
    },
    /// The run completed normally. Terminal.
    Done {
        /// The emitting agent's identifier.
        agent_id: String,
        /// The final textual answer.
        text: String,
    },
    /// The run failed. Terminal.
    Error {
        /// The emitting agent's identifier.
        agent_id: String,
        /// A human-readable description of the failure.
        message: String,
    },
}

impl Event {
    /// Whether this event is terminal (`Done` or `Error`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Done { .. } | Event::Error { .. })
    }

    /// The identifier of the agent that emitted this event.
    #[must_use]
    pub fn agent_id(&self) -> &str {
        match self {
            Event::Text { agent_id, .. }
            | Event::ToolCall { agent_id, .. }
            | Event::ToolResult { agent_id, .. }
            | Event::Handoff { agent_id, .. }
            | Event::Done { agent_id, .. }
            | Event::Error { agent_id, .. } => agent_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_and_error_are_terminal() {
        assert!(Event::Done {
            agent_id: "a".into(),
            text: "x".into()
        }
        .is_terminal());
        assert!(Event::Error {
            agent_id: "a".into(),
            message: "x".into()
        }
        .is_terminal());
        assert!(!Event::Text {
            agent_id: "a".into(),
            text: "x".into()
        }
        .is_terminal());
    }
}
