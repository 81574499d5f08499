#![deny(missing_docs)]
//! The Plan -> Act -> Observe -> Replan reasoning loop (`spec.md` §4.1).
//!
//! [`Executor`] drives a single [`agent_planner::Planner`] instance through
//! as many iterations as it takes to reach a terminal action, cancellation,
//! or iteration exhaustion, yielding [`agent_types::Event`]s as it goes.

pub mod config;
pub mod dispatch;
pub mod executor;
pub mod rebuild;

pub use config::{ExecutorConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_TIMEOUT};
pub use dispatch::{dispatch, DispatchOutcome};
pub use executor::Executor;
pub use rebuild::rebuild_messages;
