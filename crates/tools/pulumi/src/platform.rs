//! Host platform mapping for release archive names.

use std::fmt;

/// Operating system token used in Pulumi release archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// `linux`
    Linux,
    /// `darwin`
    Darwin,
    /// `windows`, also the fallback for unrecognized systems.
    Windows,
}

impl Os {
    /// The OS this binary was built for.
    #[must_use]
    pub fn current() -> Self {
        Self::parse(std::env::consts::OS)
    }

    /// Map an OS identifier onto an archive token.
    ///
    /// Anything that is not Linux or macOS maps to [`Os::Windows`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "linux" => Self::Linux,
            "darwin" | "macos" => Self::Darwin,
            _ => Self::Windows,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Darwin => write!(f, "darwin"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Release archive URL for `version` on `os`. The architecture is always x64.
#[must_use]
pub fn download_url(base: &str, version: &str, os: Os) -> String {
    format!(
        "{}/pulumi-v{version}-{os}-x64.tar.gz",
        base.trim_end_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://get.pulumi.com/releases/sdk";

    #[test]
    fn test_os_parse() {
        assert_eq!(Os::parse("linux"), Os::Linux);
        assert_eq!(Os::parse("macos"), Os::Darwin);
        assert_eq!(Os::parse("darwin"), Os::Darwin);
        assert_eq!(Os::parse("windows"), Os::Windows);
    }

    #[test]
    fn test_os_parse_case_insensitive() {
        assert_eq!(Os::parse("Linux"), Os::Linux);
        assert_eq!(Os::parse("MacOS"), Os::Darwin);
    }

    #[test]
    fn test_unknown_os_falls_back_to_windows() {
        assert_eq!(Os::parse("freebsd"), Os::Windows);
        assert_eq!(Os::parse(""), Os::Windows);
    }

    #[test]
    fn test_download_url_per_os() {
        assert_eq!(
            download_url(BASE, "3.100.0", Os::Linux),
            "https://get.pulumi.com/releases/sdk/pulumi-v3.100.0-linux-x64.tar.gz"
        );
        assert_eq!(
            download_url(BASE, "3.100.0", Os::Darwin),
            "https://get.pulumi.com/releases/sdk/pulumi-v3.100.0-darwin-x64.tar.gz"
        );
        assert_eq!(
            download_url(BASE, "3.100.0", Os::Windows),
            "https://get.pulumi.com/releases/sdk/pulumi-v3.100.0-windows-x64.tar.gz"
        );
    }

    #[test]
    fn test_download_url_unknown_os() {
        assert_eq!(
            download_url(BASE, "3.1.0", Os::parse("solaris")),
            "https://get.pulumi.com/releases/sdk/pulumi-v3.1.0-windows-x64.tar.gz"
        );
    }

    #[test]
    fn test_download_url_trailing_slash() {
        assert_eq!(
            download_url("http://localhost:8080/", "1.0.0", Os::Linux),
            "http://localhost:8080/pulumi-v1.0.0-linux-x64.tar.gz"
        );
    }
}
