//! Structured event stream for pulumi-action.
//!
//! Pipeline code emits events through the `emit_*!` macros below. They are
//! plain `tracing` events under `pulumi_action::*` targets, so they also show
//! up in any ordinary tracing output. [`ActionEventLayer`] captures them into
//! typed [`ActionEvent`]s and hands them to a renderer over a channel.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pulumi_action_events::{ActionEventLayer, ActionsRenderer, emit_stage_started};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! tracing_subscriber::registry()
//!     .with(ActionEventLayer::new(tx))
//!     .init();
//!
//! let renderer = tokio::spawn(ActionsRenderer::new(std::io::stdout()).run(rx));
//! emit_stage_started!("provision");
//! ```

pub mod event;
pub mod layer;
pub mod redaction;
pub mod renderers;

pub use event::{
    ActionEvent, CommandEvent, EventCategory, OutputEvent, PipelineEvent, SystemEvent, ToolEvent,
};
pub use layer::ActionEventLayer;
pub use redaction::{REDACTED_PLACEHOLDER, redact, register_secret, register_secrets};
pub use renderers::ActionsRenderer;

// Pipeline Events

/// Emit a stage started event.
///
/// # Example
/// ```rust,ignore
/// emit_stage_started!("provision");
/// ```
#[macro_export]
macro_rules! emit_stage_started {
    ($stage:expr) => {
        ::tracing::info!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.stage_started",
            stage = %$stage,
        )
    };
}

/// Emit a stage completed event.
#[macro_export]
macro_rules! emit_stage_completed {
    ($stage:expr) => {
        ::tracing::info!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.stage_completed",
            stage = %$stage,
        )
    };
}

/// Emit an informational pipeline message.
#[macro_export]
macro_rules! emit_info {
    ($message:expr) => {
        ::tracing::info!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.info",
            message = %$message,
        )
    };
}

/// Emit a non-fatal warning.
#[macro_export]
macro_rules! emit_warning {
    ($message:expr) => {
        ::tracing::warn!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.warning",
            message = %$message,
        )
    };
}

/// Emit a pipeline skipped event.
///
/// # Example
/// ```rust,ignore
/// emit_pipeline_skipped!("pull request action 'closed' is not handled");
/// ```
#[macro_export]
macro_rules! emit_pipeline_skipped {
    ($reason:expr) => {
        ::tracing::info!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.skipped",
            reason = %$reason,
        )
    };
}

/// Emit a pipeline failure.
#[macro_export]
macro_rules! emit_pipeline_failed {
    ($message:expr) => {
        ::tracing::error!(
            target: "pulumi_action::pipeline",
            event_type = "pipeline.failed",
            message = %$message,
        )
    };
}

// Tool Events

/// Emit a tool version resolved event.
#[macro_export]
macro_rules! emit_version_resolved {
    ($tool:expr, $version:expr) => {
        ::tracing::info!(
            target: "pulumi_action::tool",
            event_type = "tool.version_resolved",
            tool = %$tool,
            version = %$version,
        )
    };
}

/// Emit a tool cache hit event.
#[macro_export]
macro_rules! emit_tool_cache_hit {
    ($tool:expr, $version:expr, $path:expr) => {
        ::tracing::info!(
            target: "pulumi_action::tool",
            event_type = "tool.cache_hit",
            tool = %$tool,
            version = %$version,
            path = %$path,
        )
    };
}

/// Emit a tool downloading event.
///
/// # Example
/// ```rust,ignore
/// emit_tool_downloading!("pulumi", "https://get.pulumi.com/releases/sdk/pulumi-v3.0.0-linux-x64.tar.gz");
/// ```
#[macro_export]
macro_rules! emit_tool_downloading {
    ($tool:expr, $url:expr) => {
        ::tracing::info!(
            target: "pulumi_action::tool",
            event_type = "tool.downloading",
            tool = %$tool,
            url = %$url,
        )
    };
}

/// Emit a tool installed event.
#[macro_export]
macro_rules! emit_tool_installed {
    ($tool:expr, $version:expr, $path:expr) => {
        ::tracing::info!(
            target: "pulumi_action::tool",
            event_type = "tool.installed",
            tool = %$tool,
            version = %$version,
            path = %$path,
        )
    };
}

// Command Events

/// Emit a command started event.
#[macro_export]
macro_rules! emit_command_started {
    ($command:expr) => {
        ::tracing::info!(
            target: "pulumi_action::command",
            event_type = "command.started",
            command = %$command,
        )
    };
}

/// Emit a command completed event.
///
/// # Example
/// ```rust,ignore
/// emit_command_completed!("pulumi preview", 0);
/// ```
#[macro_export]
macro_rules! emit_command_completed {
    ($command:expr, $exit_code:expr) => {
        ::tracing::info!(
            target: "pulumi_action::command",
            event_type = "command.completed",
            command = %$command,
            exit_code = $exit_code,
        )
    };
}

// Output Events

/// Emit a stdout output event.
#[macro_export]
macro_rules! emit_stdout {
    ($content:expr) => {
        ::tracing::info!(
            target: "pulumi_action::output",
            event_type = "output.stdout",
            content = %$content,
        )
    };
}

/// Emit a stderr output event.
#[macro_export]
macro_rules! emit_stderr {
    ($content:expr) => {
        ::tracing::info!(
            target: "pulumi_action::output",
            event_type = "output.stderr",
            content = %$content,
        )
    };
}

/// Emit a system shutdown event.
#[macro_export]
macro_rules! emit_shutdown {
    () => {
        ::tracing::info!(
            target: "pulumi_action::system",
            event_type = "system.shutdown",
        )
    };
}

#[cfg(test)]
#[allow(clippy::cognitive_complexity)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tracing_subscriber::layer::SubscriberExt;

    fn collect(f: impl FnOnce()) -> Vec<EventCategory> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(ActionEventLayer::new(tx));
        tracing::subscriber::with_default(subscriber, f);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event.category);
        }
        events
    }

    #[test]
    fn test_pipeline_macros() {
        let events = collect(|| {
            emit_stage_started!("provision");
            emit_info!("hello");
            emit_warning!("careful");
            emit_pipeline_skipped!("nothing to do");
            emit_pipeline_failed!("boom");
            emit_stage_completed!("provision");
        });

        assert_eq!(
            events,
            vec![
                EventCategory::Pipeline(PipelineEvent::StageStarted {
                    stage: "provision".into()
                }),
                EventCategory::Pipeline(PipelineEvent::Info {
                    message: "hello".into()
                }),
                EventCategory::Pipeline(PipelineEvent::Warning {
                    message: "careful".into()
                }),
                EventCategory::Pipeline(PipelineEvent::Skipped {
                    reason: "nothing to do".into()
                }),
                EventCategory::Pipeline(PipelineEvent::Failed {
                    message: "boom".into()
                }),
                EventCategory::Pipeline(PipelineEvent::StageCompleted {
                    stage: "provision".into()
                }),
            ]
        );
    }

    #[test]
    fn test_tool_macros() {
        let events = collect(|| {
            emit_version_resolved!("pulumi", "3.100.0");
            emit_tool_cache_hit!("pulumi", "3.100.0", "/cache/pulumi/3.100.0/x64");
            emit_tool_installed!("pulumi", "3.100.0", "/cache/pulumi/3.100.0/x64");
        });

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[1],
            EventCategory::Tool(ToolEvent::CacheHit { path, .. }) if path == "/cache/pulumi/3.100.0/x64"
        ));
    }

    #[test]
    fn test_misc_macros() {
        let events = collect(|| {
            emit_command_started!("pulumi stack select staging");
            emit_stderr!("warning: something");
            emit_shutdown!();
        });

        assert_eq!(
            events.last(),
            Some(&EventCategory::System(SystemEvent::Shutdown))
        );
        assert!(events.contains(&EventCategory::Output(OutputEvent::Stderr {
            content: "warning: something".into()
        })));
    }
}
