//! pulumi-action binary.

// The panic hook and runtime startup run before logging exists.
#![allow(clippy::print_stderr)]

use clap::Parser;
use pulumi_action::cli::{Cli, EXIT_FAILURE, exit_code_for};
use pulumi_action::tracing::init_tracing;
use pulumi_action::{Pipeline, PipelineOutcome, PipelineServices};
use pulumi_action_core::{Error, Executor, Result};
use pulumi_action_events::{ActionsRenderer, emit_pipeline_failed, emit_shutdown, register_secret};
use pulumi_action_github::{GitHubCommentPublisher, GitHubEnvironment};
use pulumi_action_tools_pulumi::{LatestVersionResolver, PulumiProvisioner, ToolCache, http_client};
use std::sync::Arc;
use tokio::sync::mpsc;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("::error::pulumi-action panicked: {panic_info}");
    }));

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("::error::Failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = runtime.block_on(run(cli));
    drop(runtime);
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    let (sender, receiver) = mpsc::unbounded_channel();
    if let Err(e) = init_tracing(cli.tracing_config(), sender) {
        eprintln!("::error::{e}");
        return EXIT_FAILURE;
    }
    let renderer = tokio::spawn(ActionsRenderer::new(std::io::stdout()).run(receiver));

    let exit_code = match execute(cli).await {
        Ok(outcome) => {
            if let Some(err) = &outcome.comment_error {
                emit_pipeline_failed!(describe(err));
            }
            outcome.exit_code
        }
        Err(err) => {
            emit_pipeline_failed!(describe(&err));
            exit_code_for(&err)
        }
    };

    emit_shutdown!();
    if let Err(e) = renderer.await {
        eprintln!("Log renderer stopped unexpectedly: {e}");
    }
    exit_code
}

async fn execute(cli: Cli) -> Result<PipelineOutcome> {
    let context = GitHubEnvironment::from_env().into_context()?;
    let config = cli.into_config();
    if let Some(token) = &config.github_token {
        register_secret(token.clone());
    }

    let client = http_client()?;
    let services = PipelineServices {
        versions: Arc::new(LatestVersionResolver::new(
            client.clone(),
            config.version_endpoint.clone(),
        )),
        installer: Arc::new(PulumiProvisioner::new(
            client.clone(),
            ToolCache::new(&config.tool_cache),
            config.download_base.clone(),
        )),
        runner: Arc::new(Executor::new(&config.working_dir).with_env(context.ci_environment())),
        comments: Arc::new(GitHubCommentPublisher::with_client(client)),
    };

    Pipeline::new(&config, &context, services).run().await
}

/// The error and its sources on one line.
fn describe(err: &Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
