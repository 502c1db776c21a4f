//! Ollama API client implementation
//!
//! Talks to a locally-hosted Ollama server via /api/chat with tool calling.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChatResponse, LlmClient, LlmError, Message, ToolCall, ToolDefinition};
use crate::config::LlmConfig;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP timeout for a single chat request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Ollama API client
pub struct OllamaClient {
    model: String,
    base_url: String,
    http: Client,
    temperature: f64,
    max_tokens: u32,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "OllamaClient::from_config: called");
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for /api/chat
    fn build_request_body(&self, messages: &[Message], tools: &[ToolDefinition]) -> serde_json::Value {
        debug!(%self.model, message_count = %messages.len(), "build_request_body: called");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
            },
        });

        if !tools.is_empty() {
            debug!(tool_count = %tools.len(), "build_request_body: adding tools");
            body["tools"] = serde_json::json!(tools.iter().map(|t| t.to_openai_schema()).collect::<Vec<_>>());
        }

        body
    }

    /// Parse the /api/chat response
    fn parse_response(&self, api_response: OllamaResponse) -> ChatResponse {
        debug!("parse_response: called");
        let tool_calls = api_response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                // Ollama does not assign call ids; generate one so tool
                // results can be correlated in the conversation
                id: tc.id.unwrap_or_else(|| format!("call_{}", Uuid::new_v4())),
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        ChatResponse {
            content: api_response.message.content.unwrap_or_default(),
            tool_calls,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ChatResponse, LlmError> {
        debug!(%self.model, message_count = %messages.len(), "chat: called");
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(messages, tools);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "chat: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self.http.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "chat: network error");
                    last_error = Some(LlmError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "chat: retryable error");
                last_error = Some(LlmError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                debug!(%status, "chat: API error");
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError { status, message: text });
            }

            debug!("chat: success");
            let api_response: OllamaResponse = response.json().await?;
            return Ok(self.parse_response(api_response));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }

    async fn models(&self) -> Result<Vec<String>, LlmError> {
        debug!("models: called");
        let url = format!("{}/api/tags", self.base_url);

        let response = self.http.get(&url).send().await.map_err(LlmError::Network)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let tags: OllamaTagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// Ollama API response types

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    id: Option<String>,
    function: OllamaFunction,
}

#[derive(Debug, Deserialize)]
struct OllamaFunction {
    name: String,
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
