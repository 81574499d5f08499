//! Object-safe tool trait and the registry that holds them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use agent_types::{ToolContext, ToolDefinition, ToolError, ToolResult};

/// Object-safe trait for tool implementations.
///
/// Any tool source (local function, MCP server, HTTP endpoint, or a
/// [`crate::HandoffTool`]) implements this trait. Tools are stored as
/// `Arc<dyn Tool>` in [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given input under the run's shared context.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<ToolResult, ToolError>;

    /// This tool's projection into a [`ToolDefinition`], as seen by the oracle.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Registry of tools available to a run.
///
/// Holds tools as `Arc<dyn Tool>` keyed by name. The executor's Plan/Act
/// loop uses this to look up and dispatch tools the planner requests.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any existing tool with the same name.
    pub fn add(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Tool>, ToolError> {
        self.tools.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Iterate over all registered tools.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    /// The definitions of every registered tool, in the shape the oracle
    /// is bound to via [`agent_types::Oracle::bind_tools`].
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn tool_is_object_safe() {
        _assert_send_sync::<Arc<dyn Tool>>();
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text(args.to_string()))
        }
    }

    #[test]
    fn add_overwrites_same_name() {
        let mut registry = ToolRegistry::new();
        registry.add(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        registry.add(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_missing_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.get("missing").unwrap_err();
        assert_eq!(err.to_string(), "tool not found: missing");
    }

    #[tokio::test]
    async fn registered_tool_executes() {
        let mut registry = ToolRegistry::new();
        registry.add(Arc::new(EchoTool));
        let ctx = ToolContext::new(CancellationToken::new());
        let tool = registry.get("echo").unwrap();
        let result = tool.execute(json!({"a": 1}), &ctx).await.unwrap();
        assert!(!result.is_error);
    }
}
