//! ToolRegistry - maps tool names to instances and dispatches calls

use std::collections::HashMap;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::llm::{ToolCall, ToolDefinition};

use super::builtin::{FilesTool, ScreenTool, ShellTool};
use super::{Tool, ToolError, ToolResult};

/// Holds the tool set for one agent, built once at construction
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create the standard registry (shell, files, screen) from config
    pub fn standard(config: &ToolsConfig) -> Self {
        debug!("ToolRegistry::standard: called");
        let mut registry = Self::empty();
        registry.add_tool(Box::new(ShellTool::from_config(config)));
        registry.add_tool(Box::new(FilesTool::from_config(config)));
        registry.add_tool(Box::new(ScreenTool::from_config(config)));
        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        debug!("ToolRegistry::empty: called");
        Self { tools: HashMap::new() }
    }

    /// Add a tool to the registry
    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        debug!(tool_name = %tool.name(), "ToolRegistry::add_tool: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for the gateway
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        debug!("ToolRegistry::definitions: called");
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Dispatch a tool call
    ///
    /// An unknown tool name is an error result, never a fault; the agent loop
    /// reports it back to the model so it can retry with a valid tool.
    pub async fn dispatch(&self, tool_call: &ToolCall) -> ToolResult {
        debug!(tool_name = %tool_call.name, tool_id = %tool_call.id, "ToolRegistry::dispatch: called");
        match self.tools.get(&tool_call.name) {
            Some(tool) => {
                debug!("ToolRegistry::dispatch: tool found, executing");
                tool.execute(tool_call.arguments.clone()).await
            }
            None => {
                debug!("ToolRegistry::dispatch: unknown tool");
                ToolError::UnknownTool {
                    name: tool_call.name.clone(),
                }
                .into()
            }
        }
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_builtin_tools() {
        let registry = ToolRegistry::standard(&ToolsConfig::default());

        assert!(registry.has_tool("shell"));
        assert!(registry.has_tool("files"));
        assert!(registry.has_tool("screen"));
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let registry = ToolRegistry::standard(&ToolsConfig::default());
        let defs = registry.definitions();

        assert_eq!(defs.len(), 3);
        assert!(defs.iter().any(|d| d.name == "shell"));
        assert!(defs.iter().any(|d| d.name == "files"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::standard(&ToolsConfig::default());

        let call = ToolCall {
            id: "call_1".to_string(),
            name: "teleport".to_string(),
            arguments: serde_json::json!({}),
        };

        let result = registry.dispatch(&call).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("UnknownTool"));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_tool() {
        let registry = ToolRegistry::standard(&ToolsConfig::default());

        let call = ToolCall {
            id: "call_1".to_string(),
            name: "shell".to_string(),
            arguments: serde_json::json!({"command": "echo registry"}),
        };

        let result = registry.dispatch(&call).await;
        assert!(result.success);
        assert!(result.result.unwrap().contains("registry"));
    }
}
