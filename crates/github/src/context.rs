//! GitHub Actions event detection.
//!
//! The runner describes the triggering event through `GITHUB_*` variables and
//! a JSON payload file. [`GitHubEnvironment`] captures the raw values and
//! turns them into a [`EventContext`].

use pulumi_action_core::{Error, EventContext, Result, Trigger};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Subset of the webhook payload the pipeline needs.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    action: Option<String>,
    pull_request: Option<PullRequestPayload>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    comments_url: Option<String>,
    base: Option<BaseRef>,
}

#[derive(Debug, Deserialize)]
struct BaseRef {
    #[serde(rename = "ref")]
    ref_name: String,
}

/// Raw `GITHUB_*` values for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubEnvironment {
    /// `GITHUB_EVENT_NAME`
    pub event_name: String,
    /// `GITHUB_EVENT_PATH`
    pub event_path: Option<PathBuf>,
    /// `GITHUB_REF`
    pub git_ref: String,
    /// `GITHUB_SHA`
    pub sha: Option<String>,
    /// `GITHUB_WORKFLOW`
    pub workflow: Option<String>,
}

impl GitHubEnvironment {
    /// Read the runner variables from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            event_name: non_empty("GITHUB_EVENT_NAME").unwrap_or_default(),
            event_path: non_empty("GITHUB_EVENT_PATH").map(PathBuf::from),
            git_ref: non_empty("GITHUB_REF").unwrap_or_default(),
            sha: non_empty("GITHUB_SHA"),
            workflow: non_empty("GITHUB_WORKFLOW"),
        }
    }

    /// Build the event context, reading the payload file if there is one.
    pub fn into_context(self) -> Result<EventContext> {
        let payload = match &self.event_path {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!(
                    "failed to read event payload {}: {e}",
                    path.display()
                ))
            })?),
            None => None,
        };
        self.with_payload(payload.as_deref())
    }

    /// Build the event context from an already loaded payload.
    pub fn with_payload(self, payload: Option<&str>) -> Result<EventContext> {
        let payload: EventPayload = match payload {
            Some(json) => serde_json::from_str(json)
                .map_err(|e| Error::config(format!("failed to parse event payload: {e}")))?,
            None => EventPayload::default(),
        };

        // Any event whose payload carries a pull request is handled as one.
        let (trigger, comments_url, base_branch) = match payload.pull_request {
            Some(pr) => (
                Trigger::PullRequest,
                pr.comments_url,
                pr.base.map(|b| b.ref_name),
            ),
            None => (Trigger::from_event_name(&self.event_name), None, None),
        };
        debug!(event = %self.event_name, git_ref = %self.git_ref, ?base_branch, "Detected event context");

        Ok(EventContext {
            trigger,
            base_branch,
            current_ref: self.git_ref,
            comments_url,
            action: payload.action,
            sha: self.sha,
            workflow: self.workflow,
        })
    }
}
