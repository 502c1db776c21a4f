//! Agentic - conversational computer control through a local LLM
//!
//! A command-line agent that lets a locally-hosted language model run shell
//! commands, manipulate files, and capture screen state through a
//! conversational loop, with allow/deny safety policies on every tool.
//!
//! # Modules
//!
//! - [`agent`] - Conversation-owning agent loop
//! - [`llm`] - Gateway clients for Ollama and OpenAI-compatible backends
//! - [`tools`] - Tool trait, registry, safety policies, and built-in tools
//! - [`config`] - Configuration types and loading
//! - [`repl`] - Interactive readline session
//! - [`cli`] - Command-line interface

pub mod agent;
pub mod cli;
pub mod config;
pub mod llm;
pub mod repl;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentError, AgentState};
pub use config::{AgentConfig, Config, LlmConfig, ToolsConfig};
pub use llm::{ChatResponse, LlmClient, LlmError, Message, OllamaClient, OpenAiClient, Role, ToolCall, ToolDefinition, create_client};
pub use tools::{CommandPolicy, PathPolicy, Tool, ToolError, ToolRegistry, ToolResult};
