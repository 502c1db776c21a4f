//! Language model gateway
//!
//! Request/response clients for locally-hosted model backends.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod ollama;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use types::{ChatResponse, Message, Role, ToolCall, ToolDefinition};

use crate::config::LlmConfig;

/// Create an LLM client for the provider named in config
///
/// Supports "ollama" and "openai" (any Chat Completions compatible server).
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "ollama" => {
            debug!("create_client: creating Ollama client");
            Ok(Arc::new(OllamaClient::from_config(config)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAiClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: ollama, openai",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_ollama() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        assert!(create_client(&config).is_ok());
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = match create_client(&config) {
            Ok(_) => panic!("unknown provider must not produce a client"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
