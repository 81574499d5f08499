//! The memory collaborator — persistence of conversation state.
//!
//! Explicitly external (`spec.md` §1): the core accepts a `Memory`
//! implementation via `WithMemory` but never reads or writes it itself.
//! Embedders of the core use it to persist/restore sessions around runs.

use async_trait::async_trait;

use crate::error::ToolError;
use crate::message::Message;

/// Persists and restores conversation items keyed by session id.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Persist the given items under `session_id`.
    async fn save(&self, session_id: &str, items: Vec<Message>) -> Result<(), ToolError>;

    /// Load previously persisted items for `session_id`.
    async fn load(&self, session_id: &str) -> Result<Vec<Message>, ToolError>;
}
