//! The action's stage sequence.
//!
//! ```text
//! ModeGate -> Provision -> StackSelect -> Authenticate
//!   -> [download-auth-only: stop] -> Install -> Execute -> Comment
//! ```
//!
//! [`Pipeline::run`] never exits the process. It returns a
//! [`PipelineOutcome`] (or the error that aborted the run) and the binary
//! turns that into the exit code.

use pulumi_action_core::{
    CommandRunner, CommandSpec, CommentRequest, CommentSink, Config, CredentialFile, Error,
    EventContext, ExecutionOptions, ExecutionResult, PackageManager, Result, ToolInstaller,
    ToolVersion, VersionSource, format_comment_body, resolve_stack,
};
use pulumi_action_events::{
    emit_info, emit_pipeline_skipped, emit_stage_completed, emit_stage_started,
    emit_version_resolved, emit_warning,
};
use pulumi_action_tools_pulumi::TOOL_NAME;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Stages that do work, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Install the Pulumi CLI and put it on the search path.
    Provision,
    /// Resolve and select the stack.
    StackSelect,
    /// Activate the service account.
    Authenticate,
    /// Install the program's Node dependencies.
    Install,
    /// Run the main `pulumi` command.
    Execute,
    /// Publish the output on the pull request.
    Comment,
}

impl Stage {
    /// Display name used in log groups.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Provision => "Install Pulumi",
            Self::StackSelect => "Select stack",
            Self::Authenticate => "Authenticate",
            Self::Install => "Install dependencies",
            Self::Execute => "Run Pulumi",
            Self::Comment => "Comment on pull request",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a run that reached a terminal state.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Exit code for the process.
    pub exit_code: i32,
    /// Comment publishing failure. Never changes `exit_code`.
    pub comment_error: Option<Error>,
}

impl PipelineOutcome {
    fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            comment_error: None,
        }
    }
}

/// External services the pipeline drives.
#[derive(Clone)]
pub struct PipelineServices {
    /// Latest-version lookup.
    pub versions: Arc<dyn VersionSource>,
    /// Pulumi download and cache.
    pub installer: Arc<dyn ToolInstaller>,
    /// Subprocess execution.
    pub runner: Arc<dyn CommandRunner>,
    /// Pull request comments.
    pub comments: Arc<dyn CommentSink>,
}

/// One run of the action.
pub struct Pipeline<'a> {
    config: &'a Config,
    context: &'a EventContext,
    services: PipelineServices,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline for one triggering event.
    #[must_use]
    pub fn new(config: &'a Config, context: &'a EventContext, services: PipelineServices) -> Self {
        Self {
            config,
            context,
            services,
        }
    }

    /// Run every stage in order.
    pub async fn run(&self) -> Result<PipelineOutcome> {
        let action = self.context.action.as_deref();
        if !self.config.mode.allows(action) {
            emit_pipeline_skipped!(format!(
                "pull request action '{}' is not one of opened, edited, synchronize",
                action.unwrap_or("none")
            ));
            return Ok(PipelineOutcome::exited(0));
        }

        stage(Stage::Provision, self.provision()).await?;
        stage(Stage::StackSelect, self.select_stack()).await?;
        // The key file has to outlive every command that may read it.
        let _credentials = stage(Stage::Authenticate, self.authenticate()).await?;

        if self.config.download_auth_only {
            emit_info!("download-auth-only is set, skipping the Pulumi command");
            return Ok(PipelineOutcome::exited(0));
        }

        stage(Stage::Install, self.install()).await?;
        let (command, result) = stage(Stage::Execute, self.execute()).await?;
        let comment_error = stage(Stage::Comment, self.comment(&command, &result)).await?;

        Ok(PipelineOutcome {
            exit_code: result.exit_code,
            comment_error,
        })
    }

    async fn provision(&self) -> Result<()> {
        let version = match self.config.pulumi_version.as_deref().and_then(ToolVersion::parse) {
            Some(version) => version,
            None => self.services.versions.latest_version().await?,
        };
        emit_version_resolved!(TOOL_NAME, version);

        let dir = self.services.installer.ensure_tool(&version).await?;
        self.services.runner.prepend_path(&dir);
        Ok(())
    }

    async fn select_stack(&self) -> Result<String> {
        let stack = resolve_stack(
            self.config.explicit_stack(),
            self.context.branch_ref(),
            &self.config.mapping_path(),
        )?;
        emit_info!(format!("Using stack {stack}"));

        let select = CommandSpec::program("pulumi", ["stack", "select", stack.as_str()]);
        self.services
            .runner
            .run(&select, ExecutionOptions::CHECKED)
            .await?;
        Ok(stack)
    }

    async fn authenticate(&self) -> Result<Option<CredentialFile>> {
        let Some(blob) = self.config.credentials.as_deref() else {
            emit_warning!("No credentials provided, skipping authentication");
            return Ok(None);
        };

        let credentials = CredentialFile::from_base64(blob)?;
        self.services
            .runner
            .run(&credentials.activation_command(), ExecutionOptions::CHECKED)
            .await?;
        Ok(Some(credentials))
    }

    async fn install(&self) -> Result<()> {
        let Some(manager) = PackageManager::detect(&self.config.working_dir, self.config.force_yarn)
        else {
            emit_info!("No package.json found, skipping dependency install");
            return Ok(());
        };

        self.services
            .runner
            .run(&manager.install_command(), ExecutionOptions::CHECKED)
            .await?;
        Ok(())
    }

    async fn execute(&self) -> Result<(String, ExecutionResult)> {
        let command = self.config.main_command();
        emit_info!(format!("#### :tropical_drink: {command}"));

        let result = self
            .services
            .runner
            .run(&CommandSpec::shell(&command), ExecutionOptions::CAPTURE_ANY_EXIT)
            .await?;
        Ok((command, result))
    }

    /// Publish the output when requested. Failures are returned, not raised.
    async fn comment(&self, command: &str, result: &ExecutionResult) -> Result<Option<Error>> {
        if !self.config.comment_on_pr {
            return Ok(None);
        }
        let Some(comments_url) = self.context.comment_target() else {
            tracing::debug!("Not a pull request, skipping comment");
            return Ok(None);
        };
        let Some(token) = self.config.github_token.as_deref().filter(|t| !t.is_empty()) else {
            let err = Error::auth("comment-on-pr is set but no github-token was provided");
            emit_warning!(err);
            return Ok(Some(err));
        };

        let request = CommentRequest {
            comments_url: comments_url.to_string(),
            body: format_comment_body(command, &result.output),
            token: token.to_string(),
        };
        match self.services.comments.publish(&request).await {
            Ok(()) => Ok(None),
            Err(err) => {
                emit_warning!(format!("Failed to comment on pull request: {err}"));
                Ok(Some(err))
            }
        }
    }
}

/// Wrap a stage in started and completed events.
async fn stage<T>(stage: Stage, work: impl Future<Output = Result<T>>) -> Result<T> {
    emit_stage_started!(stage);
    let value = work.await?;
    emit_stage_completed!(stage);
    Ok(value)
}
