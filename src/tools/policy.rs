//! Safety policies for tools
//!
//! Allow/deny guards evaluated before any side effect. Policies are built
//! once from config and are immutable for the owning tool's lifetime.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Command allow/deny policy for the shell tool
///
/// Evaluation order: the command's first token must match the allow-list when
/// one is configured, then the full command is checked against the deny-list.
/// Deny always wins over allow.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    allowed: Option<Vec<String>>,
    forbidden: Vec<String>,
}

impl CommandPolicy {
    /// Create a policy from config lists
    pub fn new(allowed: Option<Vec<String>>, forbidden: Vec<String>) -> Self {
        debug!(has_allow_list = %allowed.is_some(), deny_count = %forbidden.len(), "CommandPolicy::new: called");
        Self { allowed, forbidden }
    }

    /// Check a command against the policy
    pub fn check(&self, command: &str) -> Result<(), ToolError> {
        debug!(%command, "CommandPolicy::check: called");
        let normalized = command.trim().to_lowercase();

        if let Some(allowed) = &self.allowed {
            let first_token = normalized.split_whitespace().next().unwrap_or("");
            if !allowed.iter().any(|a| first_token == a.to_lowercase()) {
                debug!(%first_token, "CommandPolicy::check: first token not allow-listed");
                return Err(ToolError::PolicyDenied(format!(
                    "command '{}' is not in the allow-list",
                    first_token
                )));
            }
        }

        // Deny wins even over an allow-listed command
        for forbidden in &self.forbidden {
            if normalized.contains(&forbidden.to_lowercase()) {
                debug!(%forbidden, "CommandPolicy::check: deny-list match");
                return Err(ToolError::PolicyDenied(format!(
                    "command matches the deny-list entry '{}'",
                    forbidden
                )));
            }
        }

        Ok(())
    }
}

/// Path allow/deny policy for the files tool
///
/// Every path is resolved to an absolute canonical form (symlinks and `..`
/// segments included) before comparison, so traversal tricks cannot bypass a
/// deny-listed root. Deny wins over allow.
#[derive(Debug, Clone)]
pub struct PathPolicy {
    allow: Option<Vec<PathBuf>>,
    deny: Vec<PathBuf>,
}

impl PathPolicy {
    /// Create a policy from config lists
    ///
    /// Roots are canonicalized up front where they exist so comparisons are
    /// canonical-to-canonical.
    pub fn new(allow: Option<Vec<PathBuf>>, deny: Vec<PathBuf>) -> Self {
        debug!(has_allow_list = %allow.is_some(), deny_count = %deny.len(), "PathPolicy::new: called");
        Self {
            allow: allow.map(canonicalize_roots),
            deny: canonicalize_roots(deny),
        }
    }

    /// Resolve a path to canonical form and check it against the policy
    ///
    /// Returns the canonical path on success so callers operate on the
    /// resolved form, never the literal input.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, ToolError> {
        debug!(?path, "PathPolicy::resolve: called");
        let canonical = canonicalize_lenient(path);

        if let Some(allow) = &self.allow
            && !allow.iter().any(|root| canonical.starts_with(root))
        {
            debug!(?canonical, "PathPolicy::resolve: not under any allow-listed root");
            return Err(ToolError::PolicyDenied(format!(
                "path {} is not under an allow-listed root",
                canonical.display()
            )));
        }

        // Deny wins even under an allow-listed root
        for root in &self.deny {
            if canonical.starts_with(root) {
                debug!(?canonical, ?root, "PathPolicy::resolve: under a deny-listed root");
                return Err(ToolError::PolicyDenied(format!(
                    "path {} is under the deny-listed root {}",
                    canonical.display(),
                    root.display()
                )));
            }
        }

        Ok(canonical)
    }
}

/// Canonicalize policy roots where they exist so comparisons are
/// canonical-to-canonical
fn canonicalize_roots(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    roots.into_iter().map(|r| r.canonicalize().unwrap_or(r)).collect()
}

/// Canonicalize a path, tolerating targets that do not exist yet
///
/// Existing paths canonicalize directly. For a path being created (e.g. a
/// `write` target), the nearest existing ancestor is canonicalized and the
/// remaining components are re-joined after stripping `.`/`..` lexically, so
/// the policy still sees the real destination.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")).join(path)
    };

    if let Ok(canonical) = absolute.canonicalize() {
        return canonical;
    }

    // The longest existing ancestor canonicalizes; the missing suffix is
    // applied lexically on top, component by component, so `..` still walks
    // upward instead of being dropped
    let mut existing = absolute.as_path();
    while !existing.exists() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => break,
        }
    }

    let remainder = absolute.strip_prefix(existing).unwrap_or_else(|_| Path::new(""));
    let mut resolved = existing.canonicalize().unwrap_or_else(|_| existing.to_path_buf());
    for component in remainder.components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_command_allow_list() {
        let policy = CommandPolicy::new(Some(vec!["ls".to_string(), "cat".to_string()]), vec![]);

        assert!(policy.check("ls -la /tmp").is_ok());
        assert!(policy.check("cat /etc/hostname").is_ok());
        assert!(policy.check("rm -rf /tmp/x").is_err());
    }

    #[test]
    fn test_command_deny_list() {
        let policy = CommandPolicy::new(None, vec!["mkfs".to_string()]);

        assert!(policy.check("echo hello").is_ok());
        assert!(policy.check("sudo mkfs.ext4 /dev/sda1").is_err());
    }

    #[test]
    fn test_command_deny_wins_over_allow() {
        let policy = CommandPolicy::new(Some(vec!["dd".to_string()]), vec!["dd if=/dev/zero of=".to_string()]);

        // Allow-listed first token, but the full command hits the deny-list
        let err = policy.check("dd if=/dev/zero of=/dev/sda").unwrap_err();
        assert!(matches!(err, ToolError::PolicyDenied(_)));
    }

    #[test]
    fn test_command_check_is_case_insensitive() {
        let policy = CommandPolicy::new(None, vec!["mkfs".to_string()]);
        assert!(policy.check("MKFS.ext4 /dev/sda1").is_err());
    }

    #[test]
    fn test_path_allow_list() {
        let temp = tempdir().unwrap();
        let policy = PathPolicy::new(Some(vec![temp.path().to_path_buf()]), vec![]);

        assert!(policy.resolve(&temp.path().join("file.txt")).is_ok());
        assert!(policy.resolve(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_path_deny_wins_over_allow() {
        let temp = tempdir().unwrap();
        let secret = temp.path().join("secret");
        std::fs::create_dir(&secret).unwrap();

        let policy = PathPolicy::new(Some(vec![temp.path().to_path_buf()]), vec![secret.clone()]);

        assert!(policy.resolve(&temp.path().join("open.txt")).is_ok());
        assert!(policy.resolve(&secret.join("key.pem")).is_err());
    }

    #[test]
    fn test_path_traversal_is_resolved_before_check() {
        let temp = tempdir().unwrap();
        let denied = temp.path().join("denied");
        let open = temp.path().join("open");
        std::fs::create_dir(&denied).unwrap();
        std::fs::create_dir(&open).unwrap();

        let policy = PathPolicy::new(None, vec![denied.clone()]);

        // Dotted route into the denied root must still be caught
        let sneaky = open.join("..").join("denied").join("target.txt");
        let err = policy.resolve(&sneaky).unwrap_err();
        assert!(matches!(err, ToolError::PolicyDenied(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_symlink_is_resolved_before_check() {
        let temp = tempdir().unwrap();
        let denied = temp.path().join("denied");
        std::fs::create_dir(&denied).unwrap();
        std::fs::write(denied.join("target.txt"), "x").unwrap();

        let link = temp.path().join("alias");
        std::os::unix::fs::symlink(&denied, &link).unwrap();

        let policy = PathPolicy::new(None, vec![denied.clone()]);

        let err = policy.resolve(&link.join("target.txt")).unwrap_err();
        assert!(matches!(err, ToolError::PolicyDenied(_)));
    }

    #[test]
    fn test_dotdot_in_missing_suffix_walks_upward() {
        let temp = tempdir().unwrap();
        let canonical_temp = temp.path().canonicalize().unwrap();

        // "new" does not exist, so the dotted suffix resolves lexically; the
        // result must land outside the temp root, not inside it
        let resolved = canonicalize_lenient(&temp.path().join("new/../../escape.txt"));
        assert_eq!(resolved, canonical_temp.parent().unwrap().join("escape.txt"));
        assert!(!resolved.starts_with(&canonical_temp));
    }

    #[test]
    fn test_nonexistent_path_resolves_against_ancestors() {
        let temp = tempdir().unwrap();
        let policy = PathPolicy::new(Some(vec![temp.path().to_path_buf()]), vec![]);

        // New file in a new subdirectory is still inside the allowed root
        assert!(policy.resolve(&temp.path().join("new/dir/file.txt")).is_ok());

        // Escaping through .. from a nonexistent leaf is not
        assert!(policy.resolve(&temp.path().join("new/../../outside.txt")).is_err());
    }
}
