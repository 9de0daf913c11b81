//! Run configuration assembled once by the entry point.

use std::path::PathBuf;

/// Arguments passed to `pulumi` when the `args` input is empty.
pub const DEFAULT_ARGS: &str = "preview";

/// Stack mapping file, relative to the working directory.
pub const DEFAULT_MAPPING_FILE: &str = ".pulumi/ci.json";

/// Endpoint returning the latest released Pulumi version as plain text.
pub const LATEST_VERSION_URL: &str = "https://www.pulumi.com/latest-version";

/// Base URL for Pulumi SDK release archives.
pub const DOWNLOAD_BASE_URL: &str = "https://get.pulumi.com/releases/sdk";

/// Environment variable holding the base64 credential blob by default.
pub const DEFAULT_CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS";

/// Pull request actions that let a `pr`-mode run proceed.
pub const ALLOWED_PR_ACTIONS: [&str; 3] = ["opened", "edited", "synchronize"];

/// How the triggering event gates the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Run for every event.
    #[default]
    Default,
    /// Only run for pull request actions in [`ALLOWED_PR_ACTIONS`].
    PullRequest,
}

impl Mode {
    /// Parse the `mode` input. Only `pr` selects pull request mode.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("pr") {
            Self::PullRequest
        } else {
            Self::Default
        }
    }

    /// Whether a run triggered with `action` should proceed.
    #[must_use]
    pub fn allows(self, action: Option<&str>) -> bool {
        match self {
            Self::Default => true,
            Self::PullRequest => action.is_some_and(|a| ALLOWED_PR_ACTIONS.contains(&a)),
        }
    }
}

/// Everything a pipeline run needs, resolved up front.
///
/// Components receive this value (or parts of it) explicitly and never read
/// action inputs or the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Event gating mode.
    pub mode: Mode,
    /// Explicit stack; wins over the mapping file when non-empty.
    pub stack: Option<String>,
    /// Arguments appended to `pulumi` for the main command.
    pub args: String,
    /// Directory every subprocess runs in.
    pub working_dir: PathBuf,
    /// Stack mapping file, relative to `working_dir` unless absolute.
    pub mapping_file: PathBuf,
    /// Use yarn even without a `yarn.lock`.
    pub force_yarn: bool,
    /// Publish the captured output on the pull request.
    pub comment_on_pr: bool,
    /// Token for the comments API.
    pub github_token: Option<String>,
    /// Stop after provisioning and authentication.
    pub download_auth_only: bool,
    /// Fixed Pulumi version; skips latest-version resolution.
    pub pulumi_version: Option<String>,
    /// Base64-encoded service account key.
    pub credentials: Option<String>,
    /// Root of the tool cache.
    pub tool_cache: PathBuf,
    /// Latest-version endpoint.
    pub version_endpoint: String,
    /// Release archive base URL.
    pub download_base: String,
}

impl Config {
    /// Create a configuration with default inputs.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>, tool_cache: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::Default,
            stack: None,
            args: DEFAULT_ARGS.to_string(),
            working_dir: working_dir.into(),
            mapping_file: PathBuf::from(DEFAULT_MAPPING_FILE),
            force_yarn: false,
            comment_on_pr: false,
            github_token: None,
            download_auth_only: false,
            pulumi_version: None,
            credentials: None,
            tool_cache: tool_cache.into(),
            version_endpoint: LATEST_VERSION_URL.to_string(),
            download_base: DOWNLOAD_BASE_URL.to_string(),
        }
    }

    /// Explicit stack, if one was given.
    #[must_use]
    pub fn explicit_stack(&self) -> Option<&str> {
        self.stack.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Absolute location of the stack mapping file.
    #[must_use]
    pub fn mapping_path(&self) -> PathBuf {
        self.working_dir.join(&self.mapping_file)
    }

    /// The main command line, e.g. `pulumi up --yes`.
    #[must_use]
    pub fn main_command(&self) -> String {
        let args = self.args.trim();
        let args = if args.is_empty() { DEFAULT_ARGS } else { args };
        format!("pulumi {args}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("pr"), Mode::PullRequest);
        assert_eq!(Mode::parse(" PR "), Mode::PullRequest);
        assert_eq!(Mode::parse(""), Mode::Default);
        assert_eq!(Mode::parse("push"), Mode::Default);
    }

    #[test]
    fn test_mode_gate() {
        for action in ALLOWED_PR_ACTIONS {
            assert!(Mode::PullRequest.allows(Some(action)));
        }
        assert!(!Mode::PullRequest.allows(Some("closed")));
        assert!(!Mode::PullRequest.allows(Some("labeled")));
        assert!(!Mode::PullRequest.allows(None));
        assert!(Mode::Default.allows(Some("closed")));
        assert!(Mode::Default.allows(None));
    }

    #[test]
    fn test_main_command() {
        let mut config = Config::new("/work", "/cache");
        assert_eq!(config.main_command(), "pulumi preview");

        config.args = "up --yes".to_string();
        assert_eq!(config.main_command(), "pulumi up --yes");

        config.args = "   ".to_string();
        assert_eq!(config.main_command(), "pulumi preview");
    }

    #[test]
    fn test_explicit_stack_ignores_blank() {
        let mut config = Config::new("/work", "/cache");
        assert_eq!(config.explicit_stack(), None);

        config.stack = Some("  ".to_string());
        assert_eq!(config.explicit_stack(), None);

        config.stack = Some("prod".to_string());
        assert_eq!(config.explicit_stack(), Some("prod"));
    }

    #[test]
    fn test_mapping_path() {
        let mut config = Config::new("/work", "/cache");
        assert_eq!(config.mapping_path(), PathBuf::from("/work/.pulumi/ci.json"));

        config.mapping_file = PathBuf::from("/etc/stacks.json");
        assert_eq!(config.mapping_path(), PathBuf::from("/etc/stacks.json"));
    }
}
