#![deny(missing_docs)]
//! Composable lifecycle hooks and an in-process event bus for the agent
//! reasoning core.

pub mod event_bus;
pub mod hooks;

pub use event_bus::{BusEvent, EventBus, SubscriptionHandle};
pub use hooks::{compose_hooks, Hooks};
