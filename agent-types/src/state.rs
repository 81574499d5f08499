//! The working set passed into every planner call.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::observation::Observation;

/// A tool's name, description, and JSON Schema, as seen by the oracle.
///
/// This is the projection of a `Tool` (defined in `agent-tool`) that
/// crosses into the oracle boundary via [`crate::Oracle::bind_tools`];
/// `agent-types` does not depend on `agent-tool` to avoid a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's unique name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: serde_json::Value,
}

/// The working set passed into every planner `Plan`/`Replan` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerState {
    /// The original input string for this run.
    pub input: String,
    /// Conversation messages built so far (§4.1.2 message rebuild).
    pub messages: Vec<Message>,
    /// Tool definitions available to the oracle this iteration.
    pub tools: Vec<ToolDefinition>,
    /// Prior observations, in completion order.
    pub observations: Vec<Observation>,
    /// Zero-based count of prior `Plan`+`Replan` calls this run.
    pub iteration: usize,
    /// Persistent, string-keyed metadata carried across iterations.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PlannerState {
    /// Create a fresh `PlannerState` at iteration 0.
    #[must_use]
    pub fn new(input: impl Into<String>, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> Self {
        Self {
            input: input.into(),
            messages,
            tools,
            observations: Vec::new(),
            iteration: 0,
            metadata: HashMap::new(),
        }
    }

    /// Read a metadata value by key.
    #[must_use]
    pub fn metadata_get(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Write a metadata value by key.
    pub fn metadata_set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_at_iteration_zero() {
        let state = PlannerState::new("hi", vec![], vec![]);
        assert_eq!(state.iteration, 0);
        assert!(state.observations.is_empty());
    }

    #[test]
    fn metadata_round_trips() {
        let mut state = PlannerState::new("hi", vec![], vec![]);
        state.metadata_set("k", serde_json::json!(42));
        assert_eq!(state.metadata_get("k"), Some(&serde_json::json!(42)));
    }
}
