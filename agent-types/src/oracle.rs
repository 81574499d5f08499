//! The oracle (LLM) collaborator — the interface the core consumes.
//!
//! Opaque and externally supplied; the core never constructs requests on
//! the wire, only `Message`s and `ToolDefinition`s. Concrete providers
//! (Anthropic, OpenAI, a local model) live outside this crate.

use std::sync::Arc;

use async_trait::async_trait;

use crate::action::ToolCall;
use crate::error::OracleError;
use crate::message::Message;
use crate::state::ToolDefinition;

/// An assistant turn produced by an oracle: text plus zero or more tool calls.
#[derive(Debug, Clone, Default)]
pub struct AiMessage {
    /// The assistant's text, possibly empty if it only emitted tool calls.
    pub text: String,
    /// Tool calls the assistant wants executed.
    pub tool_calls: Vec<ToolCall>,
}

impl AiMessage {
    /// Construct a pure-text response with no tool calls.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Construct a response carrying tool calls (and possibly accompanying text).
    #[must_use]
    pub fn with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: text.into(),
            tool_calls,
        }
    }

    /// Whether this response carries at least one tool call.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The LLM-like text-plus-tool-calls generator the core consumes.
///
/// Implementations wrap a concrete provider's wire protocol; that protocol
/// is explicitly out of this crate's scope (`spec.md` §1).
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Generate the next assistant turn from the given conversation.
    async fn generate(&self, messages: &[Message]) -> Result<AiMessage, OracleError>;

    /// Return a derived oracle that will prefer to emit structured tool
    /// calls for the given tool definitions.
    fn bind_tools(&self, tools: Vec<ToolDefinition>) -> Arc<dyn Oracle>;
}
