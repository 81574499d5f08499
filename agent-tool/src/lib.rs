#![deny(missing_docs)]
//! Tool interface, registry, and handoff-as-tool adapter for the agent
//! reasoning core.
//!
//! Any tool source (local function, MCP server, HTTP endpoint) implements
//! [`Tool`]; a [`Handoff`](agent_types::Handoff) is projected into one via
//! [`handoff_tool`].

pub mod handoff_tool;
pub mod registry;

pub use handoff_tool::HandoffTool;
pub use registry::{Tool, ToolRegistry};
