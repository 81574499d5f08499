#![deny(missing_docs)]
//! Self-Discover — SELECT, ADAPT, IMPLEMENT over a catalog of named
//! reasoning modules (`spec.md` §4.2.7).
//!
//! The adapted structure is cached on `state.metadata["self_discover_structure"]`
//! (stamped onto the first returned action) so `replan` can skip straight to
//! IMPLEMENT.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use agent_planner::{build_messages_from_state, parse_ai_response, Planner, PlannerRegistry};
use agent_types::{Action, Message, Oracle, PlannerError, PlannerState};

/// Metadata key under which the adapted structure is cached, per `spec.md` §4.2.7.
pub const STRUCTURE_METADATA_KEY: &str = "self_discover_structure";

/// One named reasoning module in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningModule {
    /// The module's name, as the oracle will reference it in SELECT.
    pub name: String,
    /// Human-readable description of what the module is for.
    pub description: String,
    /// The prompt template ADAPT integrates into the task-specific structure.
    pub template: String,
}

impl ReasoningModule {
    fn new(name: &str, description: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            template: template.to_string(),
        }
    }
}

/// The default 8-entry module catalog.
#[must_use]
pub fn default_catalog() -> Vec<ReasoningModule> {
    vec![
        ReasoningModule::new(
            "critical thinking",
            "Analyze the problem from multiple perspectives before committing to an approach.",
            "What are the different perspectives or viewpoints on this problem? What assumptions are being made?",
        ),
        ReasoningModule::new(
            "step by step",
            "Break the problem into sequential sub-steps.",
            "Let's break this down step by step: 1) ... 2) ... 3) ...",
        ),
        ReasoningModule::new(
            "decompose",
            "Split the problem into independent sub-problems.",
            "What are the sub-problems that make up this problem? Solve each independently, then combine.",
        ),
        ReasoningModule::new(
            "analogical reasoning",
            "Find a similar, already-solved problem and adapt its solution.",
            "What analogous problem have you seen before? How does its solution transfer here?",
        ),
        ReasoningModule::new(
            "constraints first",
            "Enumerate hard constraints before proposing a solution.",
            "What must any valid solution satisfy? List the constraints, then solve within them.",
        ),
        ReasoningModule::new(
            "work backwards",
            "Start from the desired outcome and reason back to the starting state.",
            "What does success look like? What is the last step before success, and the step before that?",
        ),
        ReasoningModule::new(
            "simplify",
            "Solve a simplified version of the problem first.",
            "What is a simpler version of this problem? Solve it, then generalize.",
        ),
        ReasoningModule::new(
            "verify",
            "Check the proposed solution against the original requirements before finalizing.",
            "Does the proposed solution actually satisfy every requirement? What could be wrong with it?",
        ),
    ]
}

/// Configuration for [`SelfDiscoverPlanner`].
pub struct SelfDiscoverConfig {
    /// The reasoning module catalog. Defaults to [`default_catalog`].
    pub catalog: Vec<ReasoningModule>,
}

impl Default for SelfDiscoverConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
        }
    }
}

/// The `self-discover` planner strategy.
pub struct SelfDiscoverPlanner {
    oracle: Arc<dyn Oracle>,
    catalog: Vec<ReasoningModule>,
}

impl SelfDiscoverPlanner {
    /// Construct a Self-Discover planner over the given oracle.
    #[must_use]
    pub fn new(oracle: Arc<dyn Oracle>, config: SelfDiscoverConfig) -> Self {
        Self {
            oracle,
            catalog: config.catalog,
        }
    }

    /// SELECT: ask the oracle to pick relevant modules by name, falling back
    /// to the whole catalog if nothing matched.
    async fn select(&self, state: &PlannerState) -> Vec<&ReasoningModule> {
        let listing = self
            .catalog
            .iter()
            .map(|module| format!("- {}: {}", module.name, module.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Task: {}\n\nAvailable reasoning modules:\n{listing}\n\nList the names of the modules relevant to this task, one per line.",
            state.input,
        );
        let messages = vec![Message::human(prompt)];
        let selected_names = match self.oracle.generate(&messages).await {
            Ok(response) => parse_module_names(&response.text),
            Err(_) => Vec::new(),
        };

        let matched: Vec<&ReasoningModule> = self
            .catalog
            .iter()
            .filter(|module| selected_names.iter().any(|name| name == &module.name.to_lowercase()))
            .collect();

        if matched.is_empty() {
            self.catalog.iter().collect()
        } else {
            matched
        }
    }

    /// ADAPT: integrate the selected modules' templates into one
    /// task-specific structure.
    async fn adapt(&self, state: &PlannerState, selected: &[&ReasoningModule]) -> String {
        let templates = selected
            .iter()
            .map(|module| format!("- {}: {}", module.name, module.template))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Task: {}\n\nSelected reasoning module templates:\n{templates}\n\nIntegrate these into a single task-specific reasoning structure.",
            state.input,
        );
        let messages = vec![Message::human(prompt)];
        match self.oracle.generate(&messages).await {
            Ok(response) => response.text,
            Err(_) => templates,
        }
    }

    /// IMPLEMENT: run the oracle with `structure` prepended as a system
    /// message, tool-binding applied.
    async fn implement(&self, state: &PlannerState, structure: &str) -> Result<Vec<Action>, PlannerError> {
        let bound = self.oracle.bind_tools(state.tools.clone());
        let mut messages = build_messages_from_state(state);
        messages.insert(0, Message::system(structure.to_string()));
        let response = bound
            .generate(&messages)
            .await
            .map_err(|err| PlannerError::Oracle(format!("self-discover: {err}")))?;
        let mut actions = parse_ai_response(&response);
        if let Some(first) = actions.first_mut() {
            let placeholder = Action::respond_final(String::new());
            let stamped = std::mem::replace(first, placeholder)
                .with_metadata(STRUCTURE_METADATA_KEY, serde_json::json!(structure));
            *first = stamped;
        }
        Ok(actions)
    }
}

fn parse_module_names(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| strip_list_prefix(line.trim()).to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn strip_list_prefix(line: &str) -> String {
    let trimmed = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let trimmed = trimmed.trim_start_matches(['.', ')', ':', '-', '*']).trim();
    trimmed.to_string()
}

#[async_trait]
impl Planner for SelfDiscoverPlanner {
    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn plan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        let selected = self.select(state).await;
        let structure = self.adapt(state, &selected).await;
        self.implement(state, &structure).await
    }

    #[tracing::instrument(skip_all, fields(iteration = state.iteration))]
    async fn replan(&self, state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
        match state.metadata_get(STRUCTURE_METADATA_KEY) {
            Some(serde_json::Value::String(structure)) => self.implement(state, structure).await,
            _ => self.plan(state).await,
        }
    }
}

/// This strategy's registry name.
pub const NAME: &str = "self-discover";

fn factory() -> agent_planner::PlannerFactory {
    Arc::new(|oracle, _config: serde_json::Value| {
        Ok(Arc::new(SelfDiscoverPlanner::new(oracle, SelfDiscoverConfig::default())) as Arc<dyn Planner>)
    })
}

/// Register the `self-discover` factory into `registry`. The JSON config is
/// not used; a custom catalog requires [`SelfDiscoverPlanner::new`] directly.
pub fn register(registry: &mut PlannerRegistry) {
    registry.register(NAME, factory());
}

/// Register the `self-discover` factory into the process-wide global
/// registry (`spec.md:227`: "entries registered at process initialization
/// time").
pub fn register_global() {
    agent_planner::register_global(NAME, factory());
}
