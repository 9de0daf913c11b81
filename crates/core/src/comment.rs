//! Pull request comment formatting and the publishing seam.

use crate::Result;
use async_trait::async_trait;

/// A comment ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRequest {
    /// Comments API URL of the pull request.
    pub comments_url: String,
    /// Markdown body.
    pub body: String,
    /// API token.
    pub token: String,
}

/// Markdown body embedding a command and its captured stdout.
#[must_use]
pub fn format_comment_body(command: &str, output: &str) -> String {
    format!("#### :tropical_drink: `{command}`\n```\n{output}\n```")
}

/// Posts comments. Not idempotent: each call creates a new comment.
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Create the comment.
    async fn publish(&self, request: &CommentRequest) -> Result<()>;
}
