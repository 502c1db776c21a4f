//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool execution
///
/// These never cross the tool boundary as faults; every variant folds into a
/// failed `ToolResult` so the model can see it and react.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("PolicyDenied: {0}")]
    PolicyDenied(String),

    #[error("Timeout: command exceeded {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("NotFound: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("UnknownTool: {name}")]
    UnknownTool { name: String },

    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
