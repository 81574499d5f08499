//! The outcome of executing one `Action`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// One content part of a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolContent {
    /// Plain text content.
    Text(String),
}

/// The result of executing a tool, returned by [`crate::Tool::execute`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Ordered content parts.
    pub content: Vec<ToolContent>,
    /// Whether this result represents an error.
    pub is_error: bool,
}

impl ToolResult {
    /// A successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(text.into())],
            is_error: false,
        }
    }

    /// An error text result.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(text.into())],
            is_error: true,
        }
    }

    /// The first text part, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|part| match part {
            ToolContent::Text(text) => Some(text.as_str()),
        })
    }

    /// All text parts joined with `\n`.
    #[must_use]
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|part| match part {
                ToolContent::Text(text) => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Records one action's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// The action that produced this observation.
    pub action: Action,
    /// The tool result, if the action was a tool call that executed.
    pub result: Option<ToolResult>,
    /// The error, if dispatching the action failed.
    pub error: Option<String>,
    /// Wall-clock latency from dispatch start to return.
    pub latency: Duration,
}

impl Observation {
    /// Construct an observation with no result and no error.
    #[must_use]
    pub fn new(action: Action, latency: Duration) -> Self {
        Self {
            action,
            result: None,
            error: None,
            latency,
        }
    }

    /// Attach a successful or failed tool result.
    #[must_use]
    pub fn with_result(mut self, result: ToolResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Attach a dispatch-level error (distinct from an `is_error` tool result).
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Whether this observation's action was a tool call.
    #[must_use]
    pub fn is_tool(&self) -> bool {
        matches!(self.action.kind, crate::action::ActionKind::Tool(_))
    }
}
