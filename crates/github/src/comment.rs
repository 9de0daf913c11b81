//! Pull request comments through the GitHub REST API.

use async_trait::async_trait;
use pulumi_action_core::{CommentRequest, CommentSink, Error, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::json;
use tracing::debug;

/// User agent sent to the GitHub API.
pub const USER_AGENT: &str = concat!("pulumi-action/", env!("CARGO_PKG_VERSION"));

const GITHUB_JSON: &str = "application/vnd.github+json";

/// Posts comments to a pull request's `comments_url`.
///
/// Every call creates a new comment; re-running a workflow duplicates it.
#[derive(Debug, Clone)]
pub struct GitHubCommentPublisher {
    client: Client,
}

impl GitHubCommentPublisher {
    /// Publisher with its own HTTP client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Publisher using an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommentSink for GitHubCommentPublisher {
    async fn publish(&self, request: &CommentRequest) -> Result<()> {
        if request.token.is_empty() {
            return Err(Error::auth("no GitHub token configured for PR comments"));
        }

        debug!(url = %request.comments_url, "Posting PR comment");
        let response = self
            .client
            .post(&request.comments_url)
            .header(AUTHORIZATION, format!("token {}", request.token))
            .header(ACCEPT, GITHUB_JSON)
            .json(&json!({ "body": request.body }))
            .send()
            .await
            .map_err(|e| Error::network(format!("failed to post PR comment: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::network(format!(
                "posting PR comment returned HTTP {status}: {}",
                detail.trim()
            )));
        }
        Ok(())
    }
}
