//! Latest released version lookup.

use async_trait::async_trait;
use pulumi_action_core::{Error, Result, ToolVersion, VersionSource};
use reqwest::Client;
use tracing::debug;

/// Resolves the latest Pulumi version from a plain-text endpoint.
#[derive(Debug, Clone)]
pub struct LatestVersionResolver {
    client: Client,
    endpoint: String,
}

impl LatestVersionResolver {
    /// Create a resolver for `endpoint`.
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VersionSource for LatestVersionResolver {
    async fn latest_version(&self) -> Result<ToolVersion> {
        debug!(endpoint = %self.endpoint, "Resolving latest version");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| Error::network(format!("GET {} failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "GET {} returned HTTP {status}",
                self.endpoint
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("failed to read version response: {e}")))?;

        ToolVersion::parse(&body).ok_or_else(|| {
            Error::network(format!("{} returned an empty version", self.endpoint))
        })
    }
}
