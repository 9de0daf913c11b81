//! The triggering CI event, as seen by the pipeline.
//!
//! Host integrations (see the `pulumi-action-github` crate) build an
//! [`EventContext`]; the pipeline only ever reads it.

/// The kind of event that triggered the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A branch push.
    Push,
    /// A pull request event.
    PullRequest,
    /// Any other event, by name.
    Other(String),
}

impl Trigger {
    /// Map a host event name onto a trigger.
    #[must_use]
    pub fn from_event_name(name: &str) -> Self {
        match name {
            "push" => Self::Push,
            "pull_request" | "pull_request_target" => Self::PullRequest,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Event data the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// What triggered the run.
    pub trigger: Trigger,
    /// Pull request base branch.
    pub base_branch: Option<String>,
    /// The event's own git ref, e.g. `refs/heads/main`.
    pub current_ref: String,
    /// Pull request comments API URL.
    pub comments_url: Option<String>,
    /// Event action, e.g. `opened`.
    pub action: Option<String>,
    /// Commit sha the run is for.
    pub sha: Option<String>,
    /// Workflow name; present when running inside a workflow.
    pub workflow: Option<String>,
}

impl EventContext {
    /// Context for a plain push to `git_ref`.
    #[must_use]
    pub fn push(git_ref: impl Into<String>) -> Self {
        Self {
            trigger: Trigger::Push,
            base_branch: None,
            current_ref: git_ref.into(),
            comments_url: None,
            action: None,
            sha: None,
            workflow: None,
        }
    }

    /// Whether the run was triggered by a pull request.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.trigger == Trigger::PullRequest
    }

    /// The ref used for stack resolution.
    ///
    /// Pull requests resolve against their base branch, everything else
    /// against the event ref.
    #[must_use]
    pub fn branch_ref(&self) -> &str {
        match (&self.trigger, self.base_branch.as_deref()) {
            (Trigger::PullRequest, Some(base)) => base,
            _ => &self.current_ref,
        }
    }

    /// Comments URL, only for pull request events.
    #[must_use]
    pub fn comment_target(&self) -> Option<&str> {
        if self.is_pull_request() {
            self.comments_url.as_deref()
        } else {
            None
        }
    }

    /// Variables telling the Pulumi CLI which CI system it runs under.
    ///
    /// Empty unless a workflow is present.
    #[must_use]
    pub fn ci_environment(&self) -> Vec<(String, String)> {
        if self.workflow.is_none() {
            return Vec::new();
        }
        vec![
            ("PULUMI_CI_SYSTEM".to_string(), "GitHub".to_string()),
            ("PULUMI_CI_BUILD_ID".to_string(), String::new()),
            ("PULUMI_CI_BUILD_TYPE".to_string(), String::new()),
            ("PULUMI_CI_BUILD_URL".to_string(), String::new()),
            (
                "PULUMI_CI_PULL_REQUEST_SHA".to_string(),
                self.sha.clone().unwrap_or_default(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pull_request() -> EventContext {
        EventContext {
            trigger: Trigger::PullRequest,
            base_branch: Some("main".to_string()),
            current_ref: "refs/pull/7/merge".to_string(),
            comments_url: Some("https://api.github.com/repos/o/r/issues/7/comments".to_string()),
            action: Some("opened".to_string()),
            sha: Some("abc123".to_string()),
            workflow: Some("ci".to_string()),
        }
    }

    #[test]
    fn test_trigger_from_event_name() {
        assert_eq!(Trigger::from_event_name("push"), Trigger::Push);
        assert_eq!(Trigger::from_event_name("pull_request"), Trigger::PullRequest);
        assert_eq!(
            Trigger::from_event_name("pull_request_target"),
            Trigger::PullRequest
        );
        assert_eq!(
            Trigger::from_event_name("workflow_dispatch"),
            Trigger::Other("workflow_dispatch".to_string())
        );
    }

    #[test]
    fn test_branch_ref_pull_request_uses_base() {
        assert_eq!(pull_request().branch_ref(), "main");
    }

    #[test]
    fn test_branch_ref_push_uses_ref() {
        let ctx = EventContext::push("refs/heads/dev");
        assert_eq!(ctx.branch_ref(), "refs/heads/dev");
    }

    #[test]
    fn test_comment_target_only_for_pull_requests() {
        assert!(pull_request().comment_target().is_some());

        let mut push = EventContext::push("refs/heads/main");
        push.comments_url = Some("https://example.com/comments".to_string());
        assert_eq!(push.comment_target(), None);
    }

    #[test]
    fn test_ci_environment() {
        let env = pull_request().ci_environment();
        assert!(env.contains(&("PULUMI_CI_SYSTEM".to_string(), "GitHub".to_string())));
        assert!(env.contains(&(
            "PULUMI_CI_PULL_REQUEST_SHA".to_string(),
            "abc123".to_string()
        )));
        assert_eq!(env.len(), 5);

        assert!(EventContext::push("refs/heads/main").ci_environment().is_empty());
    }
}
