//! Event type definitions for structured pipeline events.
//!
//! Events are categorized by domain (pipeline stages, tool provisioning,
//! subprocess lifecycle, raw output).

/// A structured pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    /// The tracing target the event was emitted under.
    pub target: String,
    /// The event category and data.
    pub category: EventCategory,
}

impl ActionEvent {
    /// Create a new event with the given category.
    #[must_use]
    pub fn new(target: impl Into<String>, category: EventCategory) -> Self {
        Self {
            target: target.into(),
            category,
        }
    }
}

/// Event categories organized by domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventCategory {
    /// Pipeline stage lifecycle.
    Pipeline(PipelineEvent),
    /// Tool provisioning.
    Tool(ToolEvent),
    /// Subprocess lifecycle.
    Command(CommandEvent),
    /// Raw subprocess output.
    Output(OutputEvent),
    /// Process-level signals.
    System(SystemEvent),
}

/// Pipeline stage lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A stage began.
    StageStarted {
        /// Stage name.
        stage: String,
    },
    /// A stage finished without error.
    StageCompleted {
        /// Stage name.
        stage: String,
    },
    /// Informational line for the CI log.
    Info {
        /// Message text.
        message: String,
    },
    /// A non-fatal warning.
    Warning {
        /// Message text.
        message: String,
    },
    /// The pipeline short-circuited before doing any work.
    Skipped {
        /// Why the pipeline was skipped.
        reason: String,
    },
    /// A failure that should mark the CI step as failed.
    Failed {
        /// Error description.
        message: String,
    },
}

/// Tool provisioning events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEvent {
    /// The version to provision was determined.
    VersionResolved {
        /// Tool name.
        tool: String,
        /// Resolved version.
        version: String,
    },
    /// The tool was found in the local cache.
    CacheHit {
        /// Tool name.
        tool: String,
        /// Cached version.
        version: String,
        /// Cached directory.
        path: String,
    },
    /// The tool archive is being downloaded.
    Downloading {
        /// Tool name.
        tool: String,
        /// Download URL.
        url: String,
    },
    /// The tool was extracted and registered in the cache.
    Installed {
        /// Tool name.
        tool: String,
        /// Installed version.
        version: String,
        /// Registered directory.
        path: String,
    },
}

/// Subprocess lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// A subprocess was spawned.
    Started {
        /// Command line.
        command: String,
    },
    /// A subprocess exited.
    Completed {
        /// Command line.
        command: String,
        /// Exit code (1 when terminated by a signal).
        exit_code: i32,
    },
}

/// Raw output events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A chunk of subprocess stdout.
    Stdout {
        /// Output content.
        content: String,
    },
    /// A chunk of subprocess stderr.
    Stderr {
        /// Output content.
        content: String,
    },
}

/// Process-level events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEvent {
    /// No more events will follow; renderers should flush and exit.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_new_keeps_target() {
        let event = ActionEvent::new(
            "pulumi_action::output",
            EventCategory::Output(OutputEvent::Stdout {
                content: "hello".to_string(),
            }),
        );
        assert_eq!(event.target, "pulumi_action::output");
        assert_eq!(
            event.category,
            EventCategory::Output(OutputEvent::Stdout {
                content: "hello".to_string()
            })
        );
    }
}
