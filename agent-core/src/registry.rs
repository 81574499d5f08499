//! Wires every `agent-op-*` strategy into a [`PlannerRegistry`]
//! (`spec.md` §6: planner strategies are pluggable by name).
//!
//! [`AgentBuilder`](crate::builder::AgentBuilder) uses [`default_registry`]
//! unless the caller supplies its own via `with_planner_registry`, so a host
//! process can still register additional or replacement strategies without
//! going through this module at all.
//!
//! This module also seeds `agent_planner`'s process-wide global registry the
//! first time it runs ([`ensure_builtins_registered_globally`]), so that
//! `agent_planner::list_planners()`/`new_planner()` - the entry points
//! `spec.md:227` describes as "registered at process initialization time" -
//! actually see all seven built-ins rather than staying permanently empty
//! for any process that links `agent-core` (the only crate that knows all
//! seven `agent-op-*` crates by name).

use std::sync::Once;

use agent_planner::PlannerRegistry;

static GLOBAL_INIT: Once = Once::new();

/// Register all seven built-in strategies into `agent_planner`'s
/// process-wide global registry. Idempotent: only the first call across the
/// process has any effect. [`default_registry`] calls this for every caller
/// automatically; exposed separately for a caller that only wants the
/// global registry populated (e.g. one driving `agent_planner::new_planner`
/// directly) without also building a per-instance [`PlannerRegistry`].
pub fn ensure_builtins_registered_globally() {
    GLOBAL_INIT.call_once(|| {
        agent_op_react::register_global();
        agent_op_reflexion::register_global();
        agent_op_tot::register_global();
        agent_op_lats::register_global();
        agent_op_got::register_global();
        agent_op_moa::register_global();
        agent_op_self_discover::register_global();
    });
}

/// Build a fresh registry with all seven built-in strategies registered:
/// `react`, `reflexion`, `tot`, `lats`, `got`, `moa`, `self-discover`. Also
/// seeds the process-wide global registry (see
/// [`ensure_builtins_registered_globally`]).
#[must_use]
pub fn default_registry() -> PlannerRegistry {
    ensure_builtins_registered_globally();
    let mut registry = PlannerRegistry::new();
    agent_op_react::register(&mut registry);
    agent_op_reflexion::register(&mut registry);
    agent_op_tot::register(&mut registry);
    agent_op_lats::register(&mut registry);
    agent_op_got::register(&mut registry);
    agent_op_moa::register(&mut registry);
    agent_op_self_discover::register(&mut registry);
    registry
}
