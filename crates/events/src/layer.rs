//! Custom tracing Layer for capturing pipeline events.
//!
//! This layer intercepts tracing events with specific targets and fields,
//! converts them to `ActionEvent` instances, and sends them down a channel.

// Exit codes arrive as i64 from tracing and always fit an i32.
#![allow(clippy::cast_possible_truncation)]

use crate::event::{
    ActionEvent, CommandEvent, EventCategory, OutputEvent, PipelineEvent, SystemEvent, ToolEvent,
};
use crate::redaction::redact;
use tokio::sync::mpsc;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Prefix every event target must carry to be captured.
pub const EVENT_TARGET_PREFIX: &str = "pulumi_action::";

/// A tracing Layer that captures pipeline events.
///
/// Events are identified by their `target` (must start with `pulumi_action::`)
/// and an `event_type` field that specifies the event category.
pub struct ActionEventLayer {
    sender: mpsc::UnboundedSender<ActionEvent>,
}

impl ActionEventLayer {
    /// Create a new layer that sends events to the given channel.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<ActionEvent>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for ActionEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(EVENT_TARGET_PREFIX) {
            return;
        }

        let mut visitor = ActionEventVisitor::default();
        event.record(&mut visitor);

        if let Some(category) = visitor.build() {
            let _ = self.sender.send(ActionEvent::new(target, category));
        }
    }
}

/// Visitor for extracting typed fields from tracing events.
#[derive(Default)]
struct ActionEventVisitor {
    event_type: Option<String>,
    stage: Option<String>,
    message: Option<String>,
    reason: Option<String>,
    tool: Option<String>,
    version: Option<String>,
    path: Option<String>,
    url: Option<String>,
    command: Option<String>,
    content: Option<String>,
    exit_code: Option<i32>,
}

impl ActionEventVisitor {
    fn build(self) -> Option<EventCategory> {
        let category = match self.event_type.as_deref()? {
            "pipeline.stage_started" => EventCategory::Pipeline(PipelineEvent::StageStarted {
                stage: self.stage?,
            }),
            "pipeline.stage_completed" => EventCategory::Pipeline(PipelineEvent::StageCompleted {
                stage: self.stage?,
            }),
            "pipeline.info" => EventCategory::Pipeline(PipelineEvent::Info {
                message: redact(&self.message?),
            }),
            "pipeline.warning" => EventCategory::Pipeline(PipelineEvent::Warning {
                message: redact(&self.message?),
            }),
            "pipeline.skipped" => EventCategory::Pipeline(PipelineEvent::Skipped {
                reason: self.reason?,
            }),
            "pipeline.failed" => EventCategory::Pipeline(PipelineEvent::Failed {
                message: redact(&self.message?),
            }),

            "tool.version_resolved" => EventCategory::Tool(ToolEvent::VersionResolved {
                tool: self.tool?,
                version: self.version?,
            }),
            "tool.cache_hit" => EventCategory::Tool(ToolEvent::CacheHit {
                tool: self.tool?,
                version: self.version?,
                path: self.path?,
            }),
            "tool.downloading" => EventCategory::Tool(ToolEvent::Downloading {
                tool: self.tool?,
                url: self.url?,
            }),
            "tool.installed" => EventCategory::Tool(ToolEvent::Installed {
                tool: self.tool?,
                version: self.version?,
                path: self.path?,
            }),

            "command.started" => EventCategory::Command(CommandEvent::Started {
                command: redact(&self.command?),
            }),
            "command.completed" => EventCategory::Command(CommandEvent::Completed {
                command: redact(&self.command?),
                exit_code: self.exit_code?,
            }),

            "output.stdout" => EventCategory::Output(OutputEvent::Stdout {
                content: redact(&self.content?),
            }),
            "output.stderr" => EventCategory::Output(OutputEvent::Stderr {
                content: redact(&self.content?),
            }),

            "system.shutdown" => EventCategory::System(SystemEvent::Shutdown),

            _ => return None,
        };
        Some(category)
    }
}

impl Visit for ActionEventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "event_type" => &mut self.event_type,
            "stage" => &mut self.stage,
            "message" => &mut self.message,
            "reason" => &mut self.reason,
            "tool" => &mut self.tool,
            "version" => &mut self.version,
            "path" => &mut self.path,
            "url" => &mut self.url,
            "command" => &mut self.command,
            "content" => &mut self.content,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "exit_code" {
            self.exit_code = Some(value as i32);
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "exit_code" {
            self.exit_code = i32::try_from(value).ok();
        }
    }

    // `%value` fields arrive here with a Display-backed Debug impl.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}
