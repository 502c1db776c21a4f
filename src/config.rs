//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
///
/// Built once at startup from the file (if any), then CLI flags are applied
/// on top. Tool policies read from here are immutable for the tools' lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Tool policy configuration
    pub tools: ToolsConfig,

    /// Agent loop bounds
    pub agent: AgentConfig,

    /// REPL history file
    pub history_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try user config: ~/.config/agentic/config.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("agentic").join("config.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Resolve the REPL history file path
    pub fn history_file(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".agentic_history")
        })
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("ollama" or "openai")
    pub provider: String,

    /// Backend base URL
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum tokens per response
    pub max_tokens: u32,

    /// Environment variable holding a bearer key (openai provider only)
    pub api_key_env: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:30b-a3b".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            api_key_env: None,
        }
    }
}

/// Tool policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Shell command timeout in seconds
    pub shell_timeout: u64,

    /// Allow-list of command first tokens; None permits any command not denied
    pub allowed_commands: Option<Vec<String>>,

    /// Deny-list of command substrings; always enforced, even over the allow-list
    pub forbidden_commands: Vec<String>,

    /// Roots the files tool may touch; None permits any path not denied
    pub file_allow_list: Option<Vec<PathBuf>>,

    /// Roots the files tool must never touch
    pub file_deny_list: Vec<PathBuf>,

    /// Directory for screenshots; default is <data dir>/agentic/screenshots
    pub screen_save_dir: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell_timeout: 30,
            allowed_commands: None,
            forbidden_commands: default_forbidden_commands(),
            file_allow_list: None,
            file_deny_list: Vec::new(),
            screen_save_dir: None,
        }
    }
}

impl ToolsConfig {
    /// Resolve the screenshot save directory
    pub fn screen_save_dir(&self) -> PathBuf {
        self.screen_save_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("agentic")
                .join("screenshots")
        })
    }
}

/// Default deny-list of command substrings
fn default_forbidden_commands() -> Vec<String> {
    [
        "rm -rf /",
        ":(){:|:&};:",
        "mkfs",
        "> /dev/sda",
        "dd if=/dev/zero of=",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Agent loop bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool-call rounds per user turn
    pub max_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_rounds: 10 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.tools.shell_timeout, 30);
        assert!(config.tools.allowed_commands.is_none());
        assert!(config.tools.forbidden_commands.iter().any(|c| c.contains("mkfs")));
        assert_eq!(config.agent.max_rounds, 10);
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
llm:
  provider: openai
  model: gpt-4o
  temperature: 0.2
tools:
  shell_timeout: 5
  allowed_commands: [ls, cat]
agent:
  max_rounds: 3
"#
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.temperature, 0.2);
        // Unset fields keep their defaults
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.tools.shell_timeout, 5);
        assert_eq!(
            config.tools.allowed_commands,
            Some(vec!["ls".to_string(), "cat".to_string()])
        );
        assert_eq!(config.agent.max_rounds, 3);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = Config::load(Some(&PathBuf::from("/nonexistent/config.yml")));
        assert!(result.is_err());
    }
}
