#![deny(missing_docs)]
//! The `Planner` contract and the process-wide planner registry.
//!
//! `agent-op-*` crates each implement [`Planner`] and expose a
//! `register(&mut PlannerRegistry)` function (for building a fresh
//! per-instance table) plus a `register_global()` function that calls
//! [`register_global`] to add the same factory, by name, to this crate's
//! process-wide registry. Nothing in `agent-planner` itself calls either -
//! `agent-core`'s builtin registry module is what actually invokes the
//! seven `register_global()`s at first use, since `agent-planner` cannot
//! depend back on the `agent-op-*` crates that depend on it.
//! [`agent_executor`](../agent_executor) looks planners up by name or
//! accepts one constructed directly.

pub mod planner;
pub mod registry;
pub mod support;

pub use planner::Planner;
pub use registry::{list_planners, new_planner, register_global, PlannerFactory, PlannerRegistry};
pub use support::{build_messages_from_state, parse_ai_response};
