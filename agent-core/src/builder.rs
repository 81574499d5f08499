//! [`AgentBuilder`]: validated construction of an [`crate::Agent`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_executor::{Executor, ExecutorConfig};
use agent_hooks::{compose_hooks, Hooks};
use agent_planner::{Planner, PlannerRegistry};
use agent_tool::{HandoffTool, ToolRegistry};
use agent_types::{AgentHandle, ConfigError, Handoff, Memory, Oracle, Persona};

use crate::agent::Agent;
use crate::registry::default_registry;

/// Builds an [`Agent`] from its collaborators and options.
///
/// Mirrors `spec.md` §5's named options (`WithLLM`, `WithTools`, ...) as
/// `with_*` methods; [`AgentBuilder::build`] validates and assembles them
/// into a runnable [`Agent`].
pub struct AgentBuilder {
    id: String,
    oracle: Option<Arc<dyn Oracle>>,
    tools: ToolRegistry,
    persona: Persona,
    max_iterations: i64,
    timeout: Duration,
    hook_layers: Vec<Hooks>,
    handoffs: Vec<Handoff>,
    children: Vec<Arc<dyn AgentHandle>>,
    memory: Option<Arc<dyn Memory>>,
    planner: Option<Arc<dyn Planner>>,
    planner_name: String,
    planner_config: serde_json::Value,
    planner_registry: Option<PlannerRegistry>,
    metadata: HashMap<String, serde_json::Value>,
}

impl AgentBuilder {
    /// Start building an agent identified by `id`. The id names this agent
    /// as a handoff target (`transfer_to_<id>`) and labels every `Event` it
    /// emits.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            oracle: None,
            tools: ToolRegistry::new(),
            persona: Persona::default(),
            max_iterations: agent_executor::DEFAULT_MAX_ITERATIONS as i64,
            timeout: agent_executor::DEFAULT_TIMEOUT,
            hook_layers: Vec::new(),
            handoffs: Vec::new(),
            children: Vec::new(),
            memory: None,
            planner: None,
            planner_name: agent_op_react::NAME.to_string(),
            planner_config: serde_json::Value::Null,
            planner_registry: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the default oracle used to construct the planner (ignored if
    /// [`AgentBuilder::with_planner`] supplies a planner directly).
    #[must_use]
    pub fn with_llm(mut self, oracle: Arc<dyn Oracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Register a tool available to this agent's planner.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn agent_tool::Tool>) -> Self {
        self.tools.add(tool);
        self
    }

    /// Register several tools at once.
    #[must_use]
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn agent_tool::Tool>>) -> Self {
        for tool in tools {
            self.tools.add(tool);
        }
        self
    }

    /// Set the persona rendered into the run's leading system message.
    #[must_use]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Override the Plan+Replan iteration cap (default 10).
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: i64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the run's wall-clock budget (default 5 minutes).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Layer in another set of lifecycle hooks. Hooks from multiple calls
    /// compose in call order via [`compose_hooks`].
    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hook_layers.push(hooks);
        self
    }

    /// Add a declarative handoff, projected into a synthetic
    /// `transfer_to_<target_id>` tool at build time.
    #[must_use]
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoffs.push(handoff);
        self
    }

    /// Add several declarative handoffs at once.
    #[must_use]
    pub fn with_handoffs(mut self, handoffs: impl IntoIterator<Item = Handoff>) -> Self {
        for handoff in handoffs {
            self.handoffs.push(handoff);
        }
        self
    }

    /// Register a child agent both as a handoff target and under the
    /// `"children"` planner-state metadata key.
    #[must_use]
    pub fn with_child(mut self, child: Arc<dyn AgentHandle>) -> Self {
        self.children.push(child);
        self
    }

    /// Register several child agents at once.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Arc<dyn AgentHandle>>) -> Self {
        for child in children {
            self.children.push(child);
        }
        self
    }

    /// Attach a memory collaborator. Held on the built [`Agent`] for the
    /// embedder to use around runs; never read or written by the agent
    /// itself (`spec.md` §1).
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Select a built-in strategy by name (default `"react"`). Ignored if
    /// [`AgentBuilder::with_planner`] supplies a planner directly.
    #[must_use]
    pub fn with_planner_name(mut self, name: impl Into<String>) -> Self {
        self.planner_name = name.into();
        self
    }

    /// Configuration blob passed to the named strategy's factory.
    #[must_use]
    pub fn with_planner_config(mut self, config: serde_json::Value) -> Self {
        self.planner_config = config;
        self
    }

    /// Supply a fully constructed planner directly, bypassing the registry
    /// and `with_llm`/`with_planner_name`/`with_planner_config` entirely.
    #[must_use]
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Use a custom planner registry instead of the built-in seven-strategy
    /// default (useful for a host process that replaces or extends
    /// strategies).
    #[must_use]
    pub fn with_planner_registry(mut self, registry: PlannerRegistry) -> Self {
        self.planner_registry = Some(registry);
        self
    }

    /// Seed `PlannerState.metadata` with arbitrary entries before the first
    /// `plan` call.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validate and assemble the agent.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingOracle`] if no planner and no oracle
    /// were supplied, [`ConfigError::UnknownPlanner`] if `planner_name` is
    /// not in the registry, and [`ConfigError::NonPositiveMaxIterations`]
    /// if `max_iterations` is not positive.
    pub fn build(self) -> Result<Agent, ConfigError> {
        let planner = match self.planner {
            Some(planner) => planner,
            None => {
                let oracle = self.oracle.ok_or(ConfigError::MissingOracle)?;
                let registry = self.planner_registry.unwrap_or_else(default_registry);
                registry.create(&self.planner_name, oracle, self.planner_config)?
            }
        };

        let mut tools = self.tools;
        for handoff in &self.handoffs {
            tools.add(Arc::new(HandoffTool::new(handoff.clone())));
        }
        for child in &self.children {
            tools.add(Arc::new(HandoffTool::new(Handoff::new(child.clone()))));
        }

        let mut metadata = self.metadata;
        if !self.children.is_empty() {
            let ids: Vec<serde_json::Value> = self
                .children
                .iter()
                .map(|child| serde_json::Value::String(child.id().to_string()))
                .collect();
            metadata.insert("children".to_string(), serde_json::Value::Array(ids));
        }

        let hooks = if self.hook_layers.is_empty() {
            Hooks::default()
        } else {
            compose_hooks(self.hook_layers)
        };

        let config = ExecutorConfig::new(self.max_iterations, self.timeout)?;
        let executor = Executor::new(planner, config);

        Ok(Agent::new(
            self.id,
            executor,
            tools,
            self.persona,
            hooks,
            metadata,
            self.memory,
        ))
    }
}
