//! LlmClient trait definition

use async_trait::async_trait;

use super::{ChatResponse, LlmError, Message, ToolDefinition};

/// Request/response gateway to the model backend
///
/// Each call sends the full conversation plus the tool definitions the model
/// may invoke. The response is either final text or a batch of tool calls;
/// the agent loop owns the conversation state, not the client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the conversation and return the model's next step
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ChatResponse, LlmError>;

    /// List models available on the backend
    ///
    /// Doubles as the startup reachability probe.
    async fn models(&self) -> Result<Vec<String>, LlmError>;
}
