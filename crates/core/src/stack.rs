//! Stack resolution from explicit input or the branch mapping file.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Branch used when the event carries no ref.
pub const FALLBACK_BRANCH: &str = "master";

const HEADS_PREFIX: &str = "refs/heads/";

/// Strip a leading `refs/heads/` from a git ref.
#[must_use]
pub fn normalize_branch(branch_ref: &str) -> &str {
    let branch = branch_ref.strip_prefix(HEADS_PREFIX).unwrap_or(branch_ref);
    if branch.is_empty() {
        FALLBACK_BRANCH
    } else {
        branch
    }
}

/// Branch name to stack name, loaded from a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackMapping {
    entries: HashMap<String, String>,
}

impl StackMapping {
    /// Read and parse a mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read stack mapping {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse stack mapping {}: {e}",
                path.display()
            ))
        })
    }

    /// Parse mapping JSON.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        let entries = serde_json::from_str(content)?;
        Ok(Self { entries })
    }

    /// Stack for `branch`.
    #[must_use]
    pub fn get(&self, branch: &str) -> Option<&str> {
        self.entries.get(branch).map(String::as_str)
    }
}

/// Pick the stack for this run.
///
/// A non-empty `explicit` stack is returned as-is without touching the
/// mapping file.
pub fn resolve_stack(explicit: Option<&str>, branch_ref: &str, mapping_file: &Path) -> Result<String> {
    if let Some(stack) = explicit.filter(|s| !s.is_empty()) {
        tracing::debug!(stack, "using explicit stack");
        return Ok(stack.to_string());
    }

    let branch = normalize_branch(branch_ref);
    let mapping = StackMapping::load(mapping_file)?;
    let stack = mapping
        .get(branch)
        .ok_or_else(|| Error::stack_not_found(branch, mapping_file))?;
    tracing::debug!(branch, stack, "resolved stack from mapping file");
    Ok(stack.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapping_file(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ci.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_normalize_branch() {
        assert_eq!(normalize_branch("refs/heads/main"), "main");
        assert_eq!(normalize_branch("main"), "main");
        assert_eq!(normalize_branch("refs/heads/feature/x"), "feature/x");
        assert_eq!(normalize_branch("refs/tags/v1"), "refs/tags/v1");
        assert_eq!(normalize_branch(""), "master");
        assert_eq!(normalize_branch("refs/heads/"), "master");
    }

    #[test]
    fn test_resolve_from_mapping() {
        let (_dir, path) = mapping_file(r#"{"main": "prod", "dev": "staging"}"#);
        assert_eq!(resolve_stack(None, "refs/heads/dev", &path).unwrap(), "staging");
        assert_eq!(resolve_stack(None, "main", &path).unwrap(), "prod");
    }

    #[test]
    fn test_explicit_stack_wins() {
        let (_dir, path) = mapping_file(r#"{"main": "prod"}"#);
        assert_eq!(
            resolve_stack(Some("sandbox"), "refs/heads/main", &path).unwrap(),
            "sandbox"
        );
    }

    #[test]
    fn test_explicit_stack_needs_no_file() {
        let missing = Path::new("/definitely/not/here/ci.json");
        assert_eq!(resolve_stack(Some("prod"), "main", missing).unwrap(), "prod");
    }

    #[test]
    fn test_empty_explicit_falls_through() {
        let (_dir, path) = mapping_file(r#"{"main": "prod"}"#);
        assert_eq!(resolve_stack(Some(""), "main", &path).unwrap(), "prod");
    }

    #[test]
    fn test_missing_entry() {
        let (_dir, path) = mapping_file(r#"{"main": "prod"}"#);
        let err = resolve_stack(None, "refs/heads/feature", &path).unwrap_err();
        assert!(matches!(err, Error::StackNotFound { ref branch, .. } if branch == "feature"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = resolve_stack(None, "main", &dir.path().join("ci.json")).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let (_dir, path) = mapping_file("{not json");
        assert!(matches!(
            resolve_stack(None, "main", &path).unwrap_err(),
            Error::Config { .. }
        ));

        let (_dir, path) = mapping_file(r#"{"main": 3}"#);
        assert!(matches!(
            resolve_stack(None, "main", &path).unwrap_err(),
            Error::Config { .. }
        ));
    }
}
