//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::ToolError;
use crate::llm::ToolDefinition;

/// A capability the model may invoke
///
/// Implementations validate their own arguments and map every failure mode
/// (bad input, policy denial, OS errors, timeouts) into a failed `ToolResult`.
/// Nothing may panic or error past `execute`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the tool-call name the model emits)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn parameters(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value) -> ToolResult;

    /// Definition exposed to the gateway
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters())
    }
}

/// Result of a tool execution
///
/// Exactly one of `result` or `error` is populated, enforced by the
/// constructors being the only way to build one.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(result: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// Create an error result
    pub fn error(error: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Render as the content of a tool message
    pub fn render(&self) -> String {
        match (&self.result, &self.error) {
            (Some(result), _) => format!("Result: {}", result),
            (None, Some(error)) => format!("Error: {}", error),
            (None, None) => "Error: empty tool result".to_string(),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        debug!(error = %err, "ToolResult::from: folding ToolError");
        ToolResult::error(err.to_string())
    }
}
