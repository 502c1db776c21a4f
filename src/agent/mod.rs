//! Agent loop
//!
//! Owns the conversation, routes model tool-call requests through the tool
//! registry, and iterates until the model produces a final answer or a bound
//! is hit.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::llm::{LlmClient, LlmError, Message};
use crate::tools::ToolRegistry;

/// Where the agent loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    AwaitingUserInput,
    AwaitingModel,
    ProcessingToolCalls,
    Done,
    Failed,
}

/// Terminal errors for a single user turn
///
/// The conversation stays inspectable and resettable after any of these.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] LlmError),

    #[error("Tool-call loop exceeded {rounds} rounds without a final answer")]
    LoopExceeded { rounds: u32 },
}

/// A conversational agent driving one model-backed session
///
/// One agent owns one conversation; concurrent calls to the same agent must
/// be serialized by the caller. The registry's tool policies are read-only
/// after construction, so sharing a registry across agents is safe.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    conversation: Vec<Message>,
    max_rounds: u32,
    state: AgentState,
}

impl Agent {
    /// Create an agent with an explicit tool registry and system prompt
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry, system_prompt: Option<String>, max_rounds: u32) -> Self {
        debug!(max_rounds, "Agent::new: called");
        let prompt = system_prompt.unwrap_or_else(default_system_prompt);
        Self {
            llm,
            registry,
            conversation: vec![Message::system(prompt)],
            max_rounds,
            state: AgentState::AwaitingUserInput,
        }
    }

    /// Create an agent with the standard tools built from config
    pub fn from_config(config: &Config, llm: Arc<dyn LlmClient>) -> Self {
        debug!("Agent::from_config: called");
        let registry = ToolRegistry::standard(&config.tools);
        Self::new(llm, registry, None, config.agent.max_rounds)
    }

    /// Process one user turn and return the model's final answer
    ///
    /// Appends the user message, then alternates gateway calls and tool
    /// dispatch until the model answers with plain text. Re-entrant per user
    /// turn: call it again for the next turn of the same conversation.
    pub async fn chat(&mut self, input: &str) -> Result<String, AgentError> {
        debug!(input_len = %input.len(), "Agent::chat: called");
        self.conversation.push(Message::user(input));
        let tool_defs = self.registry.definitions();

        for round in 0..self.max_rounds {
            debug!(round, "Agent::chat: gateway call");
            self.state = AgentState::AwaitingModel;

            let response = match self.llm.chat(&self.conversation, &tool_defs).await {
                Ok(r) => r,
                Err(e) => {
                    // The client already retried transient failures
                    debug!(error = %e, "Agent::chat: gateway failed");
                    self.state = AgentState::Failed;
                    return Err(e.into());
                }
            };

            if response.is_final() {
                debug!(round, "Agent::chat: final answer");
                self.conversation.push(Message::assistant(&response.content));
                self.state = AgentState::Done;
                return Ok(response.content);
            }

            self.state = AgentState::ProcessingToolCalls;
            info!(
                round,
                call_count = response.tool_calls.len(),
                "Agent::chat: executing tool calls"
            );

            // The assistant turn carrying the requests precedes its results
            self.conversation
                .push(Message::assistant_tool_calls(&response.content, response.tool_calls.clone()));

            // Dispatch in request order; every result becomes a tool turn,
            // failures included, so the model can see and react to them
            for call in &response.tool_calls {
                debug!(tool_name = %call.name, tool_id = %call.id, "Agent::chat: dispatching");
                let result = self.registry.dispatch(call).await;
                self.conversation.push(Message::tool_result(&call.id, result.render()));
            }
        }

        debug!(max_rounds = %self.max_rounds, "Agent::chat: round cap exceeded");
        self.state = AgentState::Failed;
        Err(AgentError::LoopExceeded {
            rounds: self.max_rounds,
        })
    }

    /// Clear the conversation back to the system message
    ///
    /// Available in any state and always succeeds.
    pub fn reset(&mut self) {
        debug!("Agent::reset: called");
        self.conversation.truncate(1);
        self.state = AgentState::AwaitingUserInput;
    }

    /// The conversation so far
    pub fn history(&self) -> &[Message] {
        &self.conversation
    }

    /// Current loop state
    pub fn state(&self) -> AgentState {
        self.state
    }
}

/// System prompt used when none is configured
fn default_system_prompt() -> String {
    "You are a helpful assistant that can control a computer through tools.\n\
     \n\
     Available tools:\n\
     - shell: Execute shell commands\n\
     - files: Read, write, list, and manage files\n\
     - screen: Capture screenshots and get screen info\n\
     \n\
     Be concise and efficient. When asked to perform a task, use the \
     appropriate tools to accomplish it. Always confirm when a task is \
     complete."
        .to_string()
}
