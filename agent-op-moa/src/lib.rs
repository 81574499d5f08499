#![deny(missing_docs)]
//! Mixture-of-Agents — N-layer parallel fan-out with aggregator synthesis.
//!
//! Each layer's oracles run concurrently via `futures::future::join_all`.
//! Per-model outputs within a layer are collected in the layer's declared
//! index order, not completion order.

use std::sync::Arc;

use async_trait::async_trait;

use agent_planner::{parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, Message, Oracle, OracleError, PlannerError, PlannerState};

/// One fan-out layer: a list of oracle instances run in parallel.
pub type Layer = Vec<Arc<dyn Oracle>>;

/// Configuration for [`MoaPlanner`].
pub struct MoaConfig {
    /// Sequential layers, each a list of oracles run in parallel.
    pub layers: Vec<Layer>,
    /// The final synthesizer. Defaults to the planner's default oracle if
    /// not supplied at construction.
    pub aggregator: Option<Arc<dyn Oracle>>,
}

impl Default for MoaConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            aggregator: None,
        }
    }
}

/// The `moa` planner strategy.
pub struct MoaPlanner {
    default_oracle: Arc<dyn Oracle>,
    layers: Vec<Layer>,
    aggregator: Arc<dyn Oracle>,
}

impl MoaPlanner {
    /// Construct a Mixture-of-Agents planner. An empty `config.layers`
    /// defaults to one layer holding `default_oracle`; a missing
    /// `config.aggregator` defaults to `default_oracle` too.
    #[must_use]
    pub fn new(default_oracle: Arc<dyn Oracle>, config: MoaConfig) -> Self {
        let layers = if config.layers.is_empty() {
            vec![vec![default_oracle.clone()]]
        } else {
            config.layers
        };
        let aggregator = config.aggregator.unwrap_or_else(|| default_oracle.clone());
        Self {
            default_oracle,
            layers,
            aggregator,
        }
    }

    /// The run's default oracle, used when `layers`/`aggregator` were not
    /// overridden.
    #[must_use]
    pub fn default_oracle(&self) -> &Arc<dyn Oracle> {
        &self.default_oracle
    }

    async fn run_layer(
        &self,
        layer: &Layer,
        base_messages: &[Message],
        previous_outputs: &[String],
    ) -> Result<Vec<String>, OracleError> {
        let mut messages = base_messages.to_vec();
        if !previous_outputs.is_empty() {
            messages.insert(0, Message::system(summarize_previous(previous_outputs)));
        }

        let futs = layer.iter().map(|oracle| {
            let messages = messages.clone();
            async move { oracle.generate(&messages).await }
        });
        let results = futures::future::join_all(futs).await;

        let mut outputs = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(response) => outputs.push(response.text),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if outputs.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(outputs)
    }
}

fn summarize_previous(outputs: &[String]) -> String {
    let labeled = outputs
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Expert {}: {text}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Outputs from the previous layer:\n{labeled}")
}

#[async_trait]
impl Planner for MoaPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration, layers = self.layers.len()))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let base_messages = state.messages.clone();
        let mut previous_outputs: Vec<String> = Vec::new();

        for layer in &self.layers {
            previous_outputs = self
                .run_layer(layer, &base_messages, &previous_outputs)
                .await
                .map_err(|err| PlannerError::Oracle(format!("mixture-of-agents: {err}")))?;
        }

        let mut aggregate_messages = base_messages;
        if !previous_outputs.is_empty() {
            aggregate_messages.insert(
                0,
                Message::system(format!(
                    "{}\n\nCombine the strongest elements of each into one response.",
                    summarize_previous(&previous_outputs)
                )),
            );
        }

        let bound = self.aggregator.bind_tools(state.tools.clone());
        let response = bound
            .generate(&aggregate_messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("mixture-of-agents aggregator: {err}")))?;
        Ok(parse_ai_response(&response))
    }
}

/// This strategy's registry name.
pub const NAME: &str = "moa";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, _config: serde_json::Value| {
        Ok(Arc::new(MoaPlanner::new(oracle, MoaConfig::default())) as Arc<dyn Planner>)
    })
}

/// Register the `moa` factory into `registry`. The JSON config is not used
/// since oracle instances cannot be supplied through it; use
/// [`MoaPlanner::new`] directly to configure custom layers or an aggregator
/// distinct from the default oracle.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `moa` factory into the process-wide global registry
/// (`spec.md:227`: "entries registered at process initialization time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}
