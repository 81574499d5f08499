#![deny(missing_docs)]
//! Core data model and collaborator traits for the agent reasoning core.
//!
//! `Action`/`Observation`/`PlannerState`/`Event` are the value types the
//! rest of the workspace is built around; `Oracle`/`Memory`/`AgentHandle`
//! are the external collaborator interfaces the core consumes without
//! depending on their concrete implementations.

pub mod action;
pub mod error;
pub mod event;
pub mod handoff;
pub mod memory;
pub mod message;
pub mod observation;
pub mod oracle;
pub mod state;

#[cfg(feature = "testing")]
pub mod testing;

pub use action::{Action, ActionKind, ToolCall};
pub use error::{
    ConfigError, ExecError, HookError, OracleError, PlannerError, ResilienceError, ToolError,
};
pub use event::Event;
pub use handoff::{
    handoff_target_id, is_handoff_tool, AgentHandle, Handoff, HandoffInput, ToolContext,
    HANDOFF_TOOL_PREFIX,
};
pub use memory::Memory;
pub use message::{Message, Persona, Role};
pub use observation::{Observation, ToolContent, ToolResult};
pub use oracle::{AiMessage, Oracle};
pub use state::{PlannerState, ToolDefinition};
