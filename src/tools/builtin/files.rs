//! files tool - read, write, list, and manage files under a path policy

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ToolsConfig;
use crate::tools::{PathPolicy, Tool, ToolError, ToolResult};

/// File content cap for read results
const MAX_READ_BYTES: usize = 100_000;

/// File operations under a path allow/deny policy
pub struct FilesTool {
    policy: PathPolicy,
}

impl FilesTool {
    /// Build the tool from config
    pub fn from_config(config: &ToolsConfig) -> Self {
        debug!("FilesTool::from_config: called");
        Self {
            policy: PathPolicy::new(config.file_allow_list.clone(), config.file_deny_list.clone()),
        }
    }

    async fn op_read(&self, path: &Path) -> Result<String, ToolError> {
        debug!(?path, "FilesTool::op_read: called");
        if !path.exists() {
            return Err(ToolError::NotFound { path: path.to_path_buf() });
        }
        if path.is_dir() {
            return Err(ToolError::InvalidArgument(format!(
                "{} is a directory, not a file",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(path).await?;
        if content.len() > MAX_READ_BYTES {
            let cut = (0..=MAX_READ_BYTES).rev().find(|&i| content.is_char_boundary(i)).unwrap_or(0);
            return Ok(format!(
                "{}...\n[truncated, {} bytes total]",
                &content[..cut],
                content.len()
            ));
        }
        Ok(content)
    }

    async fn op_write(&self, path: &Path, content: &str) -> Result<String, ToolError> {
        debug!(?path, content_len = %content.len(), "FilesTool::op_write: called");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(format!("Written {} bytes to {}", content.len(), path.display()))
    }

    async fn op_list(&self, path: &Path) -> Result<String, ToolError> {
        debug!(?path, "FilesTool::op_list: called");
        if !path.exists() {
            return Err(ToolError::NotFound { path: path.to_path_buf() });
        }

        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(path).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let kind = if entry.file_type().await?.is_dir() { 'd' } else { '-' };
            entries.push(format!("{} {}", kind, entry.file_name().to_string_lossy()));
        }
        entries.sort();

        if entries.is_empty() {
            Ok("(empty directory)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }

    fn op_search(&self, root: &Path, pattern: &str) -> Result<String, ToolError> {
        debug!(?root, %pattern, "FilesTool::op_search: called");
        let glob = glob::Pattern::new(pattern)
            .map_err(|e| ToolError::InvalidArgument(format!("invalid glob pattern '{}': {}", pattern, e)))?;

        // Patterns with a separator match the path relative to the root,
        // bare patterns match file names at any depth
        let match_relative = pattern.contains('/');

        let mut matches = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let candidate: PathBuf = if match_relative {
                entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf()
            } else {
                PathBuf::from(entry.file_name())
            };
            if glob.matches_path(&candidate) {
                matches.push(entry.path().display().to_string());
            }
        }
        matches.sort();

        if matches.is_empty() {
            Ok("No matches found".to_string())
        } else {
            Ok(matches.join("\n"))
        }
    }

    async fn op_delete(&self, path: &Path, recursive: bool) -> Result<String, ToolError> {
        debug!(?path, %recursive, "FilesTool::op_delete: called");
        if !path.exists() {
            return Err(ToolError::NotFound { path: path.to_path_buf() });
        }

        if path.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(path).await?;
            } else {
                // Plain delete only removes an empty directory; recursive
                // removal must be asked for explicitly
                tokio::fs::remove_dir(path).await.map_err(|_| {
                    ToolError::InvalidArgument(format!(
                        "{} is not empty; pass recursive=true to delete it and its contents",
                        path.display()
                    ))
                })?;
            }
        } else {
            tokio::fs::remove_file(path).await?;
        }
        Ok(format!("Deleted {}", path.display()))
    }

    async fn op_info(&self, path: &Path) -> Result<String, ToolError> {
        debug!(?path, "FilesTool::op_info: called");
        if !path.exists() {
            return Err(ToolError::NotFound { path: path.to_path_buf() });
        }

        let meta = tokio::fs::metadata(path).await?;
        let kind = if meta.is_dir() { "directory" } else { "file" };
        let modified = meta
            .modified()
            .map(|t| DateTime::<Local>::from(t).to_rfc3339())
            .unwrap_or_else(|_| "unknown".to_string());

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            format!("{:o}", meta.permissions().mode() & 0o777)
        };
        #[cfg(not(unix))]
        let permissions = if meta.permissions().readonly() { "ro" } else { "rw" }.to_string();

        Ok(format!(
            "path: {}\ntype: {}\nsize: {}\nmodified: {}\npermissions: {}",
            path.display(),
            kind,
            meta.len(),
            modified,
            permissions
        ))
    }
}

#[async_trait]
impl Tool for FilesTool {
    fn name(&self) -> &'static str {
        "files"
    }

    fn description(&self) -> &'static str {
        "Read, write, list, and manage files. Use for creating documents, reading code, searching files, and file metadata."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["read", "write", "list", "exists", "search", "info", "delete"],
                    "description": "The file operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Path to the file or directory"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (write operation)"
                },
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern (search operation)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Delete a non-empty directory and its contents (delete operation)"
                }
            },
            "required": ["operation", "path"]
        })
    }

    async fn execute(&self, input: Value) -> ToolResult {
        debug!(?input, "FilesTool::execute: called");
        let operation = match input["operation"].as_str() {
            Some(op) => op,
            None => {
                return ToolError::InvalidArgument("operation is required and must be a string".to_string()).into();
            }
        };
        let path = match input["path"].as_str() {
            Some(p) => p,
            None => {
                return ToolError::InvalidArgument("path is required and must be a string".to_string()).into();
            }
        };

        // Canonicalize and policy-check before any side effect
        let resolved = match self.policy.resolve(Path::new(path)) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "FilesTool::execute: policy denied");
                return e.into();
            }
        };

        // exists is answered from the policy-checked path without touching it
        if operation == "exists" {
            return ToolResult::success(resolved.exists().to_string());
        }

        let outcome = match operation {
            "read" => self.op_read(&resolved).await,
            "write" => {
                let content = input["content"].as_str().unwrap_or("");
                self.op_write(&resolved, content).await
            }
            "list" => self.op_list(&resolved).await,
            "search" => match input["pattern"].as_str() {
                Some(pattern) => self.op_search(&resolved, pattern),
                None => Err(ToolError::InvalidArgument(
                    "pattern is required for the search operation".to_string(),
                )),
            },
            "delete" => {
                let recursive = input["recursive"].as_bool().unwrap_or(false);
                self.op_delete(&resolved, recursive).await
            }
            "info" => self.op_info(&resolved).await,
            other => Err(ToolError::InvalidArgument(format!("unknown operation '{}'", other))),
        };

        match outcome {
            Ok(result) => ToolResult::success(result),
            Err(e) => {
                debug!(error = %e, "FilesTool::execute: operation failed");
                e.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tool_for(root: &Path) -> FilesTool {
        FilesTool::from_config(&ToolsConfig {
            file_allow_list: Some(vec![root.to_path_buf()]),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let path = temp.path().join("nested/dir/note.txt");
        let content = "line one\nline two\n";

        let write = tool
            .execute(serde_json::json!({
                "operation": "write",
                "path": path.to_str().unwrap(),
                "content": content,
            }))
            .await;
        assert!(write.success);

        let read = tool
            .execute(serde_json::json!({"operation": "read", "path": path.to_str().unwrap()}))
            .await;
        assert!(read.success);
        assert_eq!(read.result.unwrap(), content);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let path = temp.path().join("note.txt");

        for content in ["first", "second"] {
            let result = tool
                .execute(serde_json::json!({
                    "operation": "write",
                    "path": path.to_str().unwrap(),
                    "content": content,
                }))
                .await;
            assert!(result.success);
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_read_truncates_large_files() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let path = temp.path().join("big.txt");
        std::fs::write(&path, "y".repeat(MAX_READ_BYTES + 1)).unwrap();

        let result = tool
            .execute(serde_json::json!({"operation": "read", "path": path.to_str().unwrap()}))
            .await;

        assert!(result.success);
        let payload = result.result.unwrap();
        assert!(payload.contains("[truncated"));
        assert!(payload.contains("bytes total"));
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());

        let result = tool
            .execute(serde_json::json!({
                "operation": "read",
                "path": temp.path().join("missing.txt").to_str().unwrap(),
            }))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("NotFound"));
    }

    #[tokio::test]
    async fn test_list_immediate_children_only() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        std::fs::write(temp.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/deep.txt"), "x").unwrap();

        let result = tool
            .execute(serde_json::json!({"operation": "list", "path": temp.path().to_str().unwrap()}))
            .await;

        let listing = result.result.unwrap();
        assert!(listing.contains("- a.txt"));
        assert!(listing.contains("d sub"));
        assert!(!listing.contains("deep.txt"));
    }

    #[tokio::test]
    async fn test_exists() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        std::fs::write(temp.path().join("here.txt"), "x").unwrap();

        let result = tool
            .execute(serde_json::json!({"operation": "exists", "path": temp.path().join("here.txt").to_str().unwrap()}))
            .await;
        assert_eq!(result.result.unwrap(), "true");

        let result = tool
            .execute(serde_json::json!({"operation": "exists", "path": temp.path().join("gone.txt").to_str().unwrap()}))
            .await;
        assert_eq!(result.result.unwrap(), "false");
    }

    #[tokio::test]
    async fn test_search_recursive_glob() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        std::fs::create_dir_all(temp.path().join("src/deep")).unwrap();
        std::fs::write(temp.path().join("src/deep/main.rs"), "x").unwrap();
        std::fs::write(temp.path().join("readme.md"), "x").unwrap();

        let result = tool
            .execute(serde_json::json!({
                "operation": "search",
                "path": temp.path().to_str().unwrap(),
                "pattern": "*.rs",
            }))
            .await;

        let matches = result.result.unwrap();
        assert!(matches.contains("main.rs"));
        assert!(!matches.contains("readme.md"));
    }

    #[tokio::test]
    async fn test_delete_file_and_empty_dir() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let file = temp.path().join("gone.txt");
        let dir = temp.path().join("empty");
        std::fs::write(&file, "x").unwrap();
        std::fs::create_dir(&dir).unwrap();

        for target in [&file, &dir] {
            let result = tool
                .execute(serde_json::json!({"operation": "delete", "path": target.to_str().unwrap()}))
                .await;
            assert!(result.success);
        }
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_delete_non_empty_dir_requires_recursive() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let dir = temp.path().join("full");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("inner.txt"), "x").unwrap();

        let plain = tool
            .execute(serde_json::json!({"operation": "delete", "path": dir.to_str().unwrap()}))
            .await;
        assert!(!plain.success);
        assert!(plain.error.unwrap().contains("recursive"));
        assert!(dir.exists());

        let recursive = tool
            .execute(serde_json::json!({
                "operation": "delete",
                "path": dir.to_str().unwrap(),
                "recursive": true,
            }))
            .await;
        assert!(recursive.success);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_info_is_idempotent() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());
        let path = temp.path().join("stable.txt");
        std::fs::write(&path, "constant content").unwrap();

        let call = serde_json::json!({"operation": "info", "path": path.to_str().unwrap()});
        let first = tool.execute(call.clone()).await.result.unwrap();
        let second = tool.execute(call).await.result.unwrap();

        assert_eq!(first, second);
        assert!(first.contains("size: 16"));
        assert!(first.contains("type: file"));
    }

    #[tokio::test]
    async fn test_traversal_outside_allow_list_is_denied() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());

        let sneaky = temp.path().join("x/../../../../etc/passwd");
        let result = tool
            .execute(serde_json::json!({"operation": "read", "path": sneaky.to_str().unwrap()}))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("PolicyDenied"));
    }

    #[tokio::test]
    async fn test_missing_operation_is_invalid_argument() {
        let temp = tempdir().unwrap();
        let tool = tool_for(temp.path());

        let result = tool.execute(serde_json::json!({"path": "/tmp/x"})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("InvalidArgument"));
    }
}
