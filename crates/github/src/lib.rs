//! GitHub Actions integration for pulumi-action.
//!
//! - [`GitHubEnvironment`] turns the runner's `GITHUB_*` variables and event
//!   payload into an [`EventContext`](pulumi_action_core::EventContext)
//! - [`GitHubCommentPublisher`] posts pull request comments

pub mod comment;
pub mod context;

pub use comment::GitHubCommentPublisher;
pub use context::GitHubEnvironment;
