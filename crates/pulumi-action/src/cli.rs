//! Command-line and action input parsing.
//!
//! Every input can be passed as a flag or through the `INPUT_*` variable the
//! GitHub runner sets for `with:` values. Unset inputs arrive as empty
//! strings, so blank values are treated as absent throughout.

use crate::tracing::{Level, LogFormat, TracingConfig};
use clap::{Parser, ValueEnum};
use pulumi_action_core::config::{
    DEFAULT_ARGS, DEFAULT_CREDENTIALS_ENV, DOWNLOAD_BASE_URL, LATEST_VERSION_URL,
};
use pulumi_action_core::{Config, Error, Mode};
use pulumi_action_tools_pulumi::ToolCache;
use std::path::PathBuf;

/// Successful run, skipped run, or main command exiting 0.
pub const EXIT_OK: i32 = 0;
/// Any pipeline failure without a more specific code.
pub const EXIT_FAILURE: i32 = 1;

/// Run Pulumi for the triggering GitHub event.
#[derive(Parser, Debug)]
#[command(name = "pulumi-action", version, about, long_about = None)]
pub struct Cli {
    /// Stack to select; overrides the branch mapping file
    #[arg(long, env = "INPUT_STACK")]
    pub stack: Option<String>,

    /// Arguments passed to `pulumi`
    #[arg(long, env = "INPUT_ARGS", default_value = DEFAULT_ARGS)]
    pub args: String,

    /// Directory holding the Pulumi program
    #[arg(long, env = "INPUT_ROOT")]
    pub root: Option<String>,

    /// Set to `pr` to only run for opened, edited or synchronized pull requests
    #[arg(long, env = "INPUT_MODE")]
    pub mode: Option<String>,

    /// Install dependencies with yarn even without a yarn.lock
    #[arg(long, env = "INPUT_YARN", num_args = 0..=1, default_missing_value = "true")]
    pub yarn: Option<String>,

    /// Post the command output as a pull request comment
    #[arg(
        long = "comment-on-pr",
        env = "INPUT_COMMENT-ON-PR",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub comment_on_pr: Option<String>,

    /// Token used to post pull request comments
    #[arg(long = "github-token", env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Stop after installing Pulumi and authenticating
    #[arg(
        long = "download-auth-only",
        env = "INPUT_DOWNLOAD-AUTH-ONLY",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub download_auth_only: Option<String>,

    /// Pulumi version to install instead of the latest release
    #[arg(long = "pulumi-version", env = "INPUT_PULUMI-VERSION")]
    pub pulumi_version: Option<String>,

    /// Environment variable holding the base64 service account key
    #[arg(long = "credentials-env", env = "INPUT_CREDENTIALS-ENV")]
    pub credentials_env: Option<String>,

    /// Root of the tool cache
    #[arg(long = "tool-cache", env = "RUNNER_TOOL_CACHE")]
    pub tool_cache: Option<PathBuf>,

    /// Diagnostic log format: pretty, compact or json
    #[arg(long = "log-format", env = "INPUT_LOG-FORMAT")]
    pub log_format: Option<String>,

    /// Endpoint serving the latest Pulumi version
    #[arg(long, hide = true, default_value = LATEST_VERSION_URL)]
    pub version_endpoint: String,

    /// Base URL for release archives
    #[arg(long, hide = true, default_value = DOWNLOAD_BASE_URL)]
    pub download_base: String,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Interpret an action boolean input. Anything but a truthy literal is false.
#[must_use]
pub fn input_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}

impl Cli {
    /// Diagnostic logging settings. `RUNNER_DEBUG=1` turns on debug output.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let format = self
            .log_format
            .as_deref()
            .and_then(|f| LogFormat::from_str(f.trim(), true).ok())
            .unwrap_or_default();
        let debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
        TracingConfig {
            format,
            level: if debug { Level::DEBUG } else { Level::WARN },
            filter: None,
        }
    }

    /// Resolve the inputs into a run configuration.
    ///
    /// The credential blob is read from the variable named by
    /// `credentials-env` here, so nothing downstream touches the environment.
    #[must_use]
    pub fn into_config(self) -> Config {
        let working_dir = present(self.root).map_or_else(|| PathBuf::from("."), PathBuf::from);
        let tool_cache = self
            .tool_cache
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| ToolCache::default().root().to_path_buf());
        let credentials_env =
            present(self.credentials_env).unwrap_or_else(|| DEFAULT_CREDENTIALS_ENV.to_string());

        let mut config = Config::new(working_dir, tool_cache);
        config.mode = self.mode.as_deref().map_or(Mode::Default, Mode::parse);
        config.stack = present(self.stack);
        config.args = self.args;
        config.force_yarn = input_enabled(self.yarn.as_deref());
        config.comment_on_pr = input_enabled(self.comment_on_pr.as_deref());
        config.github_token = present(self.github_token);
        config.download_auth_only = input_enabled(self.download_auth_only.as_deref());
        config.pulumi_version = present(self.pulumi_version);
        config.credentials = present(std::env::var(&credentials_env).ok());
        config.version_endpoint = self.version_endpoint;
        config.download_base = self.download_base;
        config
    }
}

/// Process exit code for a failed run.
///
/// A failed subprocess exits with its own code; everything else exits 1.
#[must_use]
pub const fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::Subprocess { exit_code, .. } if *exit_code != 0 => *exit_code,
        _ => EXIT_FAILURE,
    }
}
