//! shell tool - execute shell commands under a command policy

use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::tools::{CommandPolicy, Tool, ToolError, ToolResult};

/// Combined stdout/stderr cap before truncation
const MAX_OUTPUT_BYTES: usize = 30_000;

/// Execute a shell command under the configured policy and timeout
pub struct ShellTool {
    policy: CommandPolicy,
    timeout_secs: u64,
}

impl ShellTool {
    /// Build the tool from config
    pub fn from_config(config: &ToolsConfig) -> Self {
        debug!(timeout_secs = %config.shell_timeout, "ShellTool::from_config: called");
        Self {
            policy: CommandPolicy::new(config.allowed_commands.clone(), config.forbidden_commands.clone()),
            timeout_secs: config.shell_timeout,
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn description(&self) -> &'static str {
        "Execute a shell command and return its output. Use for running programs, system info, and command-line tasks."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        debug!(?input, "ShellTool::execute: called");
        let command = match input["command"].as_str() {
            Some(c) => c,
            None => {
                debug!("ShellTool::execute: missing command parameter");
                return ToolError::InvalidArgument("command is required and must be a string".to_string()).into();
            }
        };

        if let Err(e) = self.policy.check(command) {
            debug!(error = %e, "ShellTool::execute: policy denied");
            return e.into();
        }

        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout can take down the whole tree
        #[cfg(unix)]
        cmd.process_group(0);

        debug!("ShellTool::execute: spawning command");
        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "ShellTool::execute: failed to launch");
                return ToolResult::error(format!("Failed to launch command: {}", e));
            }
        };

        let pid = child.id();

        let output = match tokio::time::timeout(Duration::from_secs(self.timeout_secs), child.wait_with_output()).await
        {
            Ok(Ok(output)) => {
                debug!(status = ?output.status, "ShellTool::execute: command completed");
                output
            }
            Ok(Err(e)) => {
                debug!(error = %e, "ShellTool::execute: wait failed");
                return ToolResult::error(format!("Failed to execute command: {}", e));
            }
            Err(_) => {
                debug!(timeout_secs = %self.timeout_secs, "ShellTool::execute: command timed out");
                #[cfg(unix)]
                if let Some(pid) = pid {
                    use nix::sys::signal::{Signal, killpg};
                    use nix::unistd::Pid;
                    let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
                }
                return ToolError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
                .into();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(stdout_len = %stdout.len(), stderr_len = %stderr.len(), "ShellTool::execute: output lengths");

        let mut body = stdout.to_string();
        if !stderr.is_empty() {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str("Stderr: ");
            body.push_str(&stderr);
        }

        let body = truncate_output(body);

        // The command ran; its own exit code is data for the model, not a
        // tool failure
        let exit_code = output.status.code().unwrap_or(-1);
        let payload = if body.is_empty() {
            format!("Command completed with exit code {}", exit_code)
        } else {
            format!("{}\nExit code: {}", body.trim_end(), exit_code)
        };

        ToolResult::success(payload)
    }
}

/// Truncate long output at a char boundary with a marker
fn truncate_output(output: String) -> String {
    if output.len() <= MAX_OUTPUT_BYTES {
        return output;
    }
    let cut = (0..=MAX_OUTPUT_BYTES).rev().find(|&i| output.is_char_boundary(i)).unwrap_or(0);
    format!("{}...\n[truncated, {} bytes total]", &output[..cut], output.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn tool_with(config: ToolsConfig) -> ShellTool {
        ShellTool::from_config(&config)
    }

    #[tokio::test]
    async fn test_shell_basic() {
        let tool = tool_with(ToolsConfig::default());

        let result = tool.execute(serde_json::json!({"command": "echo hello"})).await;

        assert!(result.success);
        let payload = result.result.unwrap();
        assert!(payload.contains("hello"));
        assert!(payload.contains("Exit code: 0"));
    }

    #[tokio::test]
    async fn test_shell_nonzero_exit_is_still_success() {
        let tool = tool_with(ToolsConfig::default());

        let result = tool.execute(serde_json::json!({"command": "false"})).await;

        // The tool ran fine; the command's failure is data
        assert!(result.success);
        assert!(result.result.unwrap().contains("exit code 1"));
    }

    #[tokio::test]
    async fn test_shell_captures_stderr() {
        let tool = tool_with(ToolsConfig::default());

        let result = tool.execute(serde_json::json!({"command": "echo oops >&2"})).await;

        assert!(result.success);
        assert!(result.result.unwrap().contains("oops"));
    }

    #[tokio::test]
    async fn test_shell_missing_command() {
        let tool = tool_with(ToolsConfig::default());

        let result = tool.execute(serde_json::json!({})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("command is required"));
    }

    #[tokio::test]
    async fn test_shell_policy_denied() {
        let config = ToolsConfig {
            allowed_commands: Some(vec!["echo".to_string()]),
            ..Default::default()
        };
        let tool = tool_with(config);

        let result = tool.execute(serde_json::json!({"command": "cat /etc/passwd"})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("PolicyDenied"));
    }

    #[tokio::test]
    async fn test_shell_deny_wins_over_allow() {
        let config = ToolsConfig {
            allowed_commands: Some(vec!["dd".to_string()]),
            forbidden_commands: vec!["dd if=/dev/zero of=".to_string()],
            ..Default::default()
        };
        let tool = tool_with(config);

        let result = tool
            .execute(serde_json::json!({"command": "dd if=/dev/zero of=/dev/null count=1"}))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("PolicyDenied"));
    }

    #[tokio::test]
    async fn test_shell_timeout_kills_process() {
        let config = ToolsConfig {
            shell_timeout: 1,
            ..Default::default()
        };
        let tool = tool_with(config);

        let start = Instant::now();
        let result = tool.execute(serde_json::json!({"command": "sleep 30"})).await;
        let elapsed = start.elapsed();

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Timeout"));
        // Bounded margin around the configured timeout, not the sleep length
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_truncate_output() {
        let long = "x".repeat(MAX_OUTPUT_BYTES + 100);
        let truncated = truncate_output(long);
        assert!(truncated.contains("[truncated"));
        assert!(truncated.contains("bytes total"));

        let short = "hello".to_string();
        assert_eq!(truncate_output(short), "hello");
    }
}
