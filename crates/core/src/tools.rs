//! Tool version and provisioning seams.

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// A concrete tool version such as `3.120.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion(String);

impl ToolVersion {
    /// Parse a version string, trimming whitespace and a leading `v`.
    ///
    /// Returns `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let version = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if version.is_empty() {
            None
        } else {
            Some(Self(version.to_string()))
        }
    }

    /// The version string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the version to provision comes from.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// The latest released version.
    async fn latest_version(&self) -> Result<ToolVersion>;
}

/// Provisions a tool and reports the directory holding its executables.
#[async_trait]
pub trait ToolInstaller: Send + Sync {
    /// Make `version` available locally, downloading it at most once.
    async fn ensure_tool(&self, version: &ToolVersion) -> Result<PathBuf>;
}
