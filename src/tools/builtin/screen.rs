//! screen tool - capture screenshots and report display info

use async_trait::async_trait;
use chrono::Local;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::tools::{Tool, ToolError, ToolResult};

/// Capture screenshots and get screen information
pub struct ScreenTool {
    save_dir: PathBuf,
}

impl ScreenTool {
    /// Build the tool from config
    pub fn from_config(config: &ToolsConfig) -> Self {
        let save_dir = config.screen_save_dir();
        debug!(?save_dir, "ScreenTool::from_config: called");
        Self { save_dir }
    }

    /// Resolve the destination path for a capture
    fn capture_path(&self, requested: Option<&str>) -> PathBuf {
        match requested {
            Some(p) => PathBuf::from(p),
            None => {
                let stamp = Local::now().format("%Y%m%d_%H%M%S");
                self.save_dir.join(format!("screenshot_{}.png", stamp))
            }
        }
    }

    async fn op_capture(&self, requested: Option<&str>) -> Result<String, ToolError> {
        let dest = self.capture_path(requested);
        debug!(?dest, "ScreenTool::op_capture: called");

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = if cfg!(target_os = "macos") {
            tokio::process::Command::new("screencapture")
                .arg("-x")
                .arg(&dest)
                .output()
                .await
        } else {
            tokio::process::Command::new("gnome-screenshot")
                .arg("-f")
                .arg(&dest)
                .output()
                .await
        };

        let output = output.map_err(|e| ToolError::InvalidArgument(format!("screenshot utility unavailable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::InvalidArgument(format!(
                "screenshot failed: {}",
                stderr.trim()
            )));
        }

        Ok(format!("Screenshot saved to {}", dest.display()))
    }

    async fn op_info(&self) -> Result<String, ToolError> {
        debug!("ScreenTool::op_info: called");

        let output = if cfg!(target_os = "macos") {
            tokio::process::Command::new("system_profiler")
                .arg("SPDisplaysDataType")
                .output()
                .await
        } else {
            tokio::process::Command::new("xrandr").output().await
        };

        let output = output.map_err(|e| ToolError::InvalidArgument(format!("display query unavailable: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::InvalidArgument(format!(
                "display query failed: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(summarize_displays(&stdout))
    }
}

/// Summarize xrandr-style output into display count plus geometry lines
///
/// Falls back to the raw output when no connected displays are recognized
/// (e.g. system_profiler on macOS).
fn summarize_displays(raw: &str) -> String {
    let connected: Vec<&str> = raw.lines().filter(|l| l.contains(" connected")).collect();

    if connected.is_empty() {
        return raw.trim().to_string();
    }

    let mut summary = vec![format!("displays: {}", connected.len())];
    summary.extend(connected.iter().map(|l| l.trim().to_string()));
    summary.join("\n")
}

#[async_trait]
impl Tool for ScreenTool {
    fn name(&self) -> &'static str {
        "screen"
    }

    fn description(&self) -> &'static str {
        "Capture screenshots and get screen information. Useful for visual feedback on the current desktop state."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["capture", "info"],
                    "description": "The screen operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Optional path to save the screenshot (capture operation)"
                }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        debug!(?input, "ScreenTool::execute: called");
        let operation = match input["operation"].as_str() {
            Some(op) => op,
            None => {
                return ToolError::InvalidArgument("operation is required and must be a string".to_string()).into();
            }
        };

        let outcome = match operation {
            "capture" => self.op_capture(input["path"].as_str()).await,
            "info" => self.op_info().await,
            other => Err(ToolError::InvalidArgument(format!("unknown operation '{}'", other))),
        };

        match outcome {
            Ok(result) => ToolResult::success(result),
            Err(e) => {
                // No display or missing utility must not kill the agent loop
                debug!(error = %e, "ScreenTool::execute: operation failed");
                e.into()
            }
        }
    }
}
