//! Pulumi CLI provisioning for pulumi-action.
//!
//! Resolves the version to install, downloads the release archive for the
//! host OS, and keeps extracted releases in a [`ToolCache`] so each version is
//! downloaded at most once per cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use pulumi_action_tools_pulumi::{PulumiProvisioner, ToolCache, http_client};
//!
//! let provisioner = PulumiProvisioner::new(
//!     http_client()?,
//!     ToolCache::default(),
//!     "https://get.pulumi.com/releases/sdk",
//! );
//! let bin_dir = provisioner.ensure_tool(&version).await?;
//! ```

mod cache;
mod extract;
mod platform;
mod version;

pub use cache::{CACHE_ARCH, ToolCache};
pub use extract::{ARCHIVE_TOOL_DIR, tool_dir, unpack_tar_gz};
pub use platform::{Os, download_url};
pub use version::LatestVersionResolver;

use async_trait::async_trait;
use pulumi_action_core::{Error, Result, ToolInstaller, ToolVersion};
use pulumi_action_events::{emit_tool_cache_hit, emit_tool_downloading, emit_tool_installed};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Name the tool is cached under.
pub const TOOL_NAME: &str = "pulumi";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("pulumi-action/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client used for version lookups and downloads.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::network(format!("failed to create HTTP client: {e}")))
}

/// Downloads and caches Pulumi releases.
#[derive(Debug, Clone)]
pub struct PulumiProvisioner {
    client: Client,
    cache: ToolCache,
    download_base: String,
    os: Os,
}

impl PulumiProvisioner {
    /// Provisioner for the host OS.
    #[must_use]
    pub fn new(client: Client, cache: ToolCache, download_base: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            download_base: download_base.into(),
            os: Os::current(),
        }
    }

    /// Override the target OS.
    #[must_use]
    pub fn with_os(mut self, os: Os) -> Self {
        self.os = os;
        self
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ToolCache {
        &self.cache
    }

    /// Release archive URL for `version`.
    #[must_use]
    pub fn url_for(&self, version: &ToolVersion) -> String {
        download_url(&self.download_base, version.as_str(), self.os)
    }

    async fn download(&self, url: &str) -> Result<NamedTempFile> {
        let wrap = |e: Error| Error::download(url, e);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| wrap(Error::network(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(wrap(Error::network(format!("HTTP {status}"))));
        }

        let mut file = NamedTempFile::new()
            .map_err(|e| wrap(Error::io(e, None, "creating download file")))?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| wrap(Error::network(e.to_string())))?
        {
            file.write_all(&chunk)
                .map_err(|e| wrap(Error::io(e, None, "writing download file")))?;
        }
        file.flush()
            .map_err(|e| wrap(Error::io(e, None, "writing download file")))?;

        debug!(url, path = ?file.path(), "Downloaded archive");
        Ok(file)
    }

    fn install(&self, archive: &Path, version: &ToolVersion) -> Result<PathBuf> {
        let staging = self.cache.staging_dir()?;
        unpack_tar_gz(archive, staging.path())?;
        let extracted = tool_dir(staging.path())?;
        self.cache.register(TOOL_NAME, version.as_str(), &extracted)
    }
}

#[async_trait]
impl ToolInstaller for PulumiProvisioner {
    async fn ensure_tool(&self, version: &ToolVersion) -> Result<PathBuf> {
        if let Some(dir) = self.cache.find(TOOL_NAME, version.as_str()) {
            emit_tool_cache_hit!(TOOL_NAME, version, dir.display());
            return Ok(dir);
        }

        let url = self.url_for(version);
        emit_tool_downloading!(TOOL_NAME, url);
        let archive = self.download(&url).await?;

        let dir = self.install(archive.path(), version)?;
        emit_tool_installed!(TOOL_NAME, version, dir.display());
        Ok(dir)
    }
}
