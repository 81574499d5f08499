#![deny(missing_docs)]
//! The agent facade: `Agent`, `AgentBuilder`, and the built-in planner
//! registry, assembled over the reasoning core's lower crates
//! (`spec.md` §5).
//!
//! ```ignore
//! use std::sync::Arc;
//! use agent_core::AgentBuilder;
//!
//! let agent = AgentBuilder::new("assistant")
//!     .with_llm(oracle)
//!     .with_planner_name("react")
//!     .build()?;
//! let answer = agent.invoke("What's the weather?", Default::default()).await?;
//! ```

pub mod agent;
pub mod builder;
pub mod registry;

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use registry::default_registry;
