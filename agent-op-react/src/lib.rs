#![deny(missing_docs)]
//! ReAct — single-shot reasoning plus tool-calling.
//!
//! Binds the run's tool set to the oracle, calls it once, and returns the
//! parsed actions. Stateless: `replan` is the inherited default (delegates
//! to `plan`), which is correct here since ReAct carries nothing across
//! iterations.

use std::sync::Arc;

use async_trait::async_trait;

use agent_planner::{build_messages_from_state, parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, Oracle, PlannerError, PlannerState};

/// The `react` planner strategy.
pub struct ReactPlanner {
    oracle: Arc<dyn Oracle>,
}

impl ReactPlanner {
    /// Construct a ReAct planner over the given oracle.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Planner for ReactPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let bound = self.oracle.bind_tools(state.tools.clone());
        let messages = build_messages_from_state(state);
        let response = bound
            .generate(&messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("react: {err}")))?;
        Ok(parse_ai_response(&response))
    }
}

/// This strategy's registry name.
pub const NAME: &str = "react";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, _config: serde_json::Value| {
        Ok(Arc::new(ReactPlanner::new(oracle)) as Arc<dyn Planner>)
    })
}

/// Register the `react` factory into `registry`.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `react` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}
