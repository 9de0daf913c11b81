//! Versioned tool cache.
//!
//! Entries become visible atomically: the extracted directory is renamed into
//! place and only then is a completion marker written next to it. A lookup
//! requires both, so an interrupted install is never returned.

use pulumi_action_core::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, trace};

/// Architecture segment of every cache entry.
pub const CACHE_ARCH: &str = "x64";

/// On-disk tool cache keyed by (tool, version).
///
/// Structure:
/// ```text
/// <root>/
/// └── pulumi/
///     └── 3.100.0/
///         ├── x64/          # tool directory, added to PATH
///         └── x64.complete  # written after x64/ is in place
/// ```
#[derive(Debug, Clone)]
pub struct ToolCache {
    root: PathBuf,
}

impl Default for ToolCache {
    fn default() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("pulumi-action")
            .join("tools");
        Self::new(root)
    }
}

impl ToolCache {
    /// Create a cache rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory an entry lives in once registered.
    #[must_use]
    pub fn entry_dir(&self, tool: &str, version: &str) -> PathBuf {
        self.root.join(tool).join(version).join(CACHE_ARCH)
    }

    /// Completion marker for an entry.
    #[must_use]
    pub fn marker_path(&self, tool: &str, version: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(version)
            .join(format!("{CACHE_ARCH}.complete"))
    }

    /// Look up a fully registered entry.
    #[must_use]
    pub fn find(&self, tool: &str, version: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(tool, version);
        if self.marker_path(tool, version).is_file() && dir.is_dir() {
            trace!(tool, version, ?dir, "Cache hit");
            Some(dir)
        } else {
            trace!(tool, version, "Cache miss");
            None
        }
    }

    /// A scratch directory on the same filesystem as the cache.
    ///
    /// Extraction happens here so registration is a rename, not a copy. The
    /// directory is removed when the returned guard drops.
    pub fn staging_dir(&self) -> Result<TempDir> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| Error::io(e, Some(self.root.clone()), "creating tool cache"))?;
        tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|e| Error::io(e, Some(self.root.clone()), "creating staging directory"))
    }

    /// Move `source` into the cache as (tool, version) and mark it complete.
    pub fn register(&self, tool: &str, version: &str, source: &Path) -> Result<PathBuf> {
        let dest = self.entry_dir(tool, version);
        let marker = self.marker_path(tool, version);

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io(e, Some(parent.to_path_buf()), "creating cache entry"))?;
        }

        // Leftovers from an interrupted install have no marker.
        if dest.exists() {
            debug!(?dest, "Removing incomplete cache entry");
            std::fs::remove_dir_all(&dest)
                .map_err(|e| Error::io(e, Some(dest.clone()), "removing incomplete cache entry"))?;
        }

        std::fs::rename(source, &dest)
            .map_err(|e| Error::io(e, Some(dest.clone()), "moving tool into cache"))?;
        std::fs::write(&marker, b"")
            .map_err(|e| Error::io(e, Some(marker.clone()), "writing cache marker"))?;

        debug!(tool, version, ?dest, "Registered tool in cache");
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_paths() {
        let cache = ToolCache::new("/tmp/cache");
        assert_eq!(
            cache.entry_dir("pulumi", "3.100.0"),
            PathBuf::from("/tmp/cache/pulumi/3.100.0/x64")
        );
        assert_eq!(
            cache.marker_path("pulumi", "3.100.0"),
            PathBuf::from("/tmp/cache/pulumi/3.100.0/x64.complete")
        );
    }

    #[test]
    fn test_cache_default() {
        let cache = ToolCache::default();
        assert!(cache.root().ends_with("pulumi-action/tools"));
    }

    #[test]
    fn test_register_and_find() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path());
        assert!(cache.find("pulumi", "1.0.0").is_none());

        let staging = cache.staging_dir()?;
        let source = staging.path().join("pulumi");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("pulumi"), b"binary").unwrap();

        let dest = cache.register("pulumi", "1.0.0", &source)?;
        assert_eq!(cache.find("pulumi", "1.0.0"), Some(dest.clone()));
        assert_eq!(std::fs::read(dest.join("pulumi")).unwrap(), b"binary");
        Ok(())
    }

    #[test]
    fn test_unmarked_entry_is_invisible() {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path());
        std::fs::create_dir_all(cache.entry_dir("pulumi", "1.0.0")).unwrap();

        assert!(cache.find("pulumi", "1.0.0").is_none());
    }

    #[test]
    fn test_marker_without_dir_is_invisible() {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path());
        let marker = cache.marker_path("pulumi", "1.0.0");
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, b"").unwrap();

        assert!(cache.find("pulumi", "1.0.0").is_none());
    }

    #[test]
    fn test_register_replaces_incomplete_entry() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path());
        let stale = cache.entry_dir("pulumi", "1.0.0");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("partial"), b"half").unwrap();

        let source = temp.path().join("fresh");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join("pulumi"), b"whole").unwrap();

        let dest = cache.register("pulumi", "1.0.0", &source)?;
        assert!(!dest.join("partial").exists());
        assert!(dest.join("pulumi").exists());
        Ok(())
    }

    #[test]
    fn test_staging_dir_is_inside_root() -> Result<()> {
        let temp = TempDir::new().unwrap();
        let cache = ToolCache::new(temp.path().join("nested"));
        let staging = cache.staging_dir()?;
        assert!(staging.path().starts_with(cache.root()));
        Ok(())
    }
}
