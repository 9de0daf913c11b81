//! Diagnostic logging for the action binary.
//!
//! Two consumers share one subscriber: the [`ActionEventLayer`] receives every
//! `pulumi_action::*` event for the workflow log renderer, while the fmt layer
//! writes filtered diagnostics to stderr. The filter sits on the fmt layer only,
//! so a quiet log level never starves the renderer.

use pulumi_action_events::{ActionEvent, ActionEventLayer};
use std::io;
pub use tracing::Level;
use tracing::Metadata;
use tracing_subscriber::filter::{EnvFilter, FilterExt, filter_fn};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Diagnostic output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// Structured JSON, one object per line
    Json,
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format for stderr diagnostics.
    pub format: LogFormat,
    /// Level used when no filter is given.
    pub level: Level,
    /// Explicit `EnvFilter` directives; falls back to `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

static CORRELATION_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Correlation ID for this run, attached to the startup diagnostic.
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Events meant for the renderer carry an `event_type` field.
fn is_diagnostic(metadata: &Metadata<'_>) -> bool {
    metadata.fields().field("event_type").is_none()
}

fn level_directive(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Install the global subscriber.
pub fn init_tracing(
    config: TracingConfig,
    events: UnboundedSender<ActionEvent>,
) -> miette::Result<()> {
    let env_filter = if let Some(filter) = config.filter {
        EnvFilter::try_new(filter)
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level_directive(config.level)))
    }
    .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;
    let fmt_filter = env_filter.and(filter_fn(is_diagnostic));

    let registry = tracing_subscriber::registry().with(ActionEventLayer::new(events));

    let installed = match config.format {
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(fmt_filter);
            registry.with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(fmt_filter);
            registry.with(layer).try_init()
        }
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_filter(fmt_filter);
            registry.with(layer).try_init()
        }
    };
    installed.map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        correlation_id = %correlation_id(),
        format = ?config.format,
        "Tracing initialized"
    );
    Ok(())
}
