//! Name → factory table for planner strategies, plus a process-wide default
//! instance whose entries register at process initialization time.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use agent_types::{ConfigError, Oracle};

use crate::planner::Planner;

/// Constructs a configured [`Planner`] given the run's default oracle (set
/// via `WithLLM`) and a JSON config blob. Each `agent-op-*` crate's factory
/// deserializes its own config type from `config` via
/// `serde_json::from_value`; oracles themselves cross this boundary as the
/// `Arc<dyn Oracle>` parameter since they cannot round-trip through JSON.
pub type PlannerFactory = Arc<
    dyn Fn(Arc<dyn Oracle>, serde_json::Value) -> Result<Arc<dyn Planner>, ConfigError>
        + Send
        + Sync,
>;

/// A name → factory table. `register` is last-writer-wins per name, matching
/// [`agent_tool::ToolRegistry`]'s registration policy.
#[derive(Default, Clone)]
pub struct PlannerRegistry {
    factories: HashMap<String, PlannerFactory>,
}

impl PlannerRegistry {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`. Overwrites any existing entry.
    pub fn register(&mut self, name: impl Into<String>, factory: PlannerFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Construct a planner by name, passing `oracle` and `config` through to
    /// its factory.
    pub fn create(
        &self,
        name: &str,
        oracle: Arc<dyn Oracle>,
        config: serde_json::Value,
    ) -> Result<Arc<dyn Planner>, ConfigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownPlanner(name.to_string()))?;
        factory(oracle, config)
    }

    /// Registered planner names, sorted lexicographically.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

static GLOBAL: OnceLock<RwLock<PlannerRegistry>> = OnceLock::new();

fn global() -> &'static RwLock<PlannerRegistry> {
    GLOBAL.get_or_init(|| RwLock::new(PlannerRegistry::new()))
}

/// Register a factory in the process-wide default registry.
pub fn register_global(name: impl Into<String>, factory: PlannerFactory) {
    global().write().expect("lock poisoned").register(name, factory);
}

/// Construct a planner by name from the process-wide default registry.
pub fn new_planner(
    name: &str,
    oracle: Arc<dyn Oracle>,
    config: serde_json::Value,
) -> Result<Arc<dyn Planner>, ConfigError> {
    global().read().expect("lock poisoned").create(name, oracle, config)
}

/// Names registered in the process-wide default registry, sorted
/// lexicographically.
#[must_use]
pub fn list_planners() -> Vec<String> {
    global().read().expect("lock poisoned").list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::{Action, AiMessage, OracleError, PlannerError, PlannerState, ToolDefinition};
    use async_trait::async_trait;

    struct StubPlanner;

    #[async_trait]
    impl Planner for StubPlanner {
        async fn plan(&self, _state: &PlannerState) -> Result<Vec<Action>, PlannerError> {
            Ok(vec![Action::respond_final("stub")])
        }
    }

    struct StubOracle;

    #[async_trait]
    impl Oracle for StubOracle {
        async fn generate(&self, _messages: &[agent_types::Message]) -> Result<AiMessage, OracleError> {
            Ok(AiMessage::text("stub"))
        }
        fn bind_tools(&self, _tools: Vec<ToolDefinition>) -> Arc<dyn Oracle> {
            Arc::new(StubOracle)
        }
    }

    fn oracle() -> Arc<dyn Oracle> {
        Arc::new(StubOracle)
    }

    #[test]
    fn unknown_planner_is_an_error() {
        let registry = PlannerRegistry::new();
        let err = registry.create("nope", oracle(), serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlanner(name) if name == "nope"));
    }

    #[test]
    fn register_then_create_round_trips() {
        let mut registry = PlannerRegistry::new();
        registry.register("stub", Arc::new(|_o, _cfg| Ok(Arc::new(StubPlanner) as Arc<dyn Planner>)));
        let planner = registry.create("stub", oracle(), serde_json::Value::Null).unwrap();
        let _ = planner;
    }

    #[test]
    fn list_is_sorted() {
        let mut registry = PlannerRegistry::new();
        registry.register("zeta", Arc::new(|_o, _cfg| Ok(Arc::new(StubPlanner) as Arc<dyn Planner>)));
        registry.register("alpha", Arc::new(|_o, _cfg| Ok(Arc::new(StubPlanner) as Arc<dyn Planner>)));
        assert_eq!(registry.list(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn register_overwrites_same_name() {
        let mut registry = PlannerRegistry::new();
        registry.register("stub", Arc::new(|_o, _cfg| Ok(Arc::new(StubPlanner) as Arc<dyn Planner>)));
        registry.register("stub", Arc::new(|_o, _cfg| Ok(Arc::new(StubPlanner) as Arc<dyn Planner>)));
        assert_eq!(registry.list().len(), 1);
    }
}
