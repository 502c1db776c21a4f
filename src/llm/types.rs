//! LLM request/response types
//!
//! These types mirror the OpenAI-style chat wire format, which both supported
//! providers (Ollama and OpenAI-compatible servers) speak natively.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A message in the conversation
///
/// Serializes directly into the chat wire format. A conversation starts with
/// at most one `System` message; each `Tool` message carries the
/// `tool_call_id` of a tool call from a preceding `Assistant` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,

    /// Tool calls requested by the model (assistant messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Id of the tool call this message answers (tool messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        debug!("Message::system: called");
        Self {
            role: Role::System,
            content: text.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        debug!(call_count = %tool_calls.len(), "Message::assistant_tool_calls: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }

    /// Create a tool result message answering the given call id
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        debug!("Message::tool_result: called");
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model
///
/// The id is unique within its assistant message. Ollama omits ids on the
/// wire, so clients generate one when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Response from a chat request
///
/// Empty `tool_calls` means the model produced a final answer.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Text content (may be empty when the model only calls tools)
    pub content: String,

    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    /// Whether this response is a final answer (no tool calls)
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Tool definition exposed to the LLM
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        let name = name.into();
        debug!(%name, "ToolDefinition::new: called");
        Self {
            name,
            description: description.into(),
            parameters,
        }
    }

    /// Convert to the OpenAI function-calling schema format
    ///
    /// Ollama's /api/chat accepts the same envelope.
    pub fn to_openai_schema(&self) -> serde_json::Value {
        debug!(%self.name, "ToolDefinition::to_openai_schema: called");
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}
