//! Node dependency installation for Pulumi programs.

use crate::executor::CommandSpec;
use std::path::Path;

/// Package manager used to install a program's dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// `npm install`
    Npm,
    /// `yarn install`
    Yarn,
}

impl PackageManager {
    /// Pick a package manager for `dir`.
    ///
    /// Returns `None` when there is no `package.json`. Yarn is chosen when
    /// forced or when a `yarn.lock` is present.
    #[must_use]
    pub fn detect(dir: &Path, force_yarn: bool) -> Option<Self> {
        if !dir.join("package.json").is_file() {
            return None;
        }
        if force_yarn || dir.join("yarn.lock").is_file() {
            Some(Self::Yarn)
        } else {
            Some(Self::Npm)
        }
    }

    /// Executable name.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }

    /// The install invocation.
    #[must_use]
    pub fn install_command(self) -> CommandSpec {
        CommandSpec::program(self.program(), ["install"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_manifest() {
        let dir = TempDir::new().unwrap();
        assert_eq!(PackageManager::detect(dir.path(), false), None);
        assert_eq!(PackageManager::detect(dir.path(), true), None);
    }

    #[test]
    fn test_npm_by_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(
            PackageManager::detect(dir.path(), false),
            Some(PackageManager::Npm)
        );
    }

    #[test]
    fn test_yarn_lock_selects_yarn() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("yarn.lock"), "").unwrap();
        assert_eq!(
            PackageManager::detect(dir.path(), false),
            Some(PackageManager::Yarn)
        );
    }

    #[test]
    fn test_forced_yarn() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        assert_eq!(
            PackageManager::detect(dir.path(), true),
            Some(PackageManager::Yarn)
        );
    }

    #[test]
    fn test_install_command() {
        assert_eq!(
            PackageManager::Yarn.install_command().to_string(),
            "yarn install"
        );
        assert_eq!(PackageManager::Npm.install_command().to_string(), "npm install");
    }
}
