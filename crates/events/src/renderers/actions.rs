//! GitHub Actions log renderer.
//!
//! Writes events in the runner's workflow-command syntax: stages become
//! collapsible `::group::` blocks, failures and subprocess stderr become
//! `::error::` annotations, and subprocess stdout is passed through untouched.

use crate::event::{
    ActionEvent, CommandEvent, EventCategory, OutputEvent, PipelineEvent, SystemEvent, ToolEvent,
};
use std::io::{self, Write};
use tokio::sync::mpsc;

/// Renders pipeline events to a writer using GitHub Actions log syntax.
#[derive(Debug)]
pub struct ActionsRenderer<W: Write> {
    out: W,
    open_group: bool,
}

impl<W: Write> ActionsRenderer<W> {
    /// Create a renderer writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            open_group: false,
        }
    }

    /// Consume events until a shutdown event arrives or the channel closes.
    ///
    /// Returns the underlying writer so callers can inspect it.
    pub async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<ActionEvent>) -> W {
        while let Some(event) = receiver.recv().await {
            if matches!(event.category, EventCategory::System(SystemEvent::Shutdown)) {
                break;
            }
            // A broken stdout pipe must not abort the pipeline.
            let _ = self.render(&event);
        }
        let _ = self.close_group();
        let _ = self.out.flush();
        self.out
    }

    /// Render a single event.
    pub fn render(&mut self, event: &ActionEvent) -> io::Result<()> {
        match &event.category {
            EventCategory::Pipeline(e) => self.render_pipeline(e),
            EventCategory::Tool(e) => self.render_tool(e),
            EventCategory::Command(e) => self.render_command(e),
            EventCategory::Output(e) => self.render_output(e),
            EventCategory::System(SystemEvent::Shutdown) => self.close_group(),
        }
    }

    fn render_pipeline(&mut self, event: &PipelineEvent) -> io::Result<()> {
        match event {
            PipelineEvent::StageStarted { stage } => {
                self.close_group()?;
                writeln!(self.out, "::group::{stage}")?;
                self.open_group = true;
                Ok(())
            }
            PipelineEvent::StageCompleted { .. } => self.close_group(),
            PipelineEvent::Info { message } => writeln!(self.out, "{message}"),
            PipelineEvent::Warning { message } => {
                writeln!(self.out, "::warning::{}", escape_data(message))
            }
            PipelineEvent::Skipped { reason } => writeln!(self.out, "Skipping: {reason}"),
            PipelineEvent::Failed { message } => {
                self.close_group()?;
                writeln!(self.out, "::error::{}", escape_data(message))
            }
        }
    }

    fn render_tool(&mut self, event: &ToolEvent) -> io::Result<()> {
        match event {
            ToolEvent::VersionResolved { tool, version } => {
                writeln!(self.out, "Resolved {tool} version {version}")
            }
            ToolEvent::CacheHit {
                tool,
                version,
                path,
            } => writeln!(self.out, "Found {tool} {version} in tool cache: {path}"),
            ToolEvent::Downloading { tool, url } => {
                writeln!(self.out, "Downloading {tool} from {url}")
            }
            ToolEvent::Installed {
                tool,
                version,
                path,
            } => writeln!(self.out, "Installed {tool} {version} to {path}"),
        }
    }

    fn render_command(&mut self, event: &CommandEvent) -> io::Result<()> {
        match event {
            CommandEvent::Started { command } => writeln!(self.out, "[command]{command}"),
            CommandEvent::Completed { exit_code: 0, .. } => Ok(()),
            CommandEvent::Completed { command, exit_code } => {
                writeln!(self.out, "`{command}` exited with code {exit_code}")
            }
        }
    }

    fn render_output(&mut self, event: &OutputEvent) -> io::Result<()> {
        match event {
            OutputEvent::Stdout { content } => {
                self.out.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    self.out.write_all(b"\n")?;
                }
                Ok(())
            }
            OutputEvent::Stderr { content } => {
                let line = content.trim_end_matches(['\r', '\n']);
                writeln!(self.out, "::error::{}", escape_data(line))
            }
        }
    }

    fn close_group(&mut self) -> io::Result<()> {
        if self.open_group {
            self.open_group = false;
            writeln!(self.out, "::endgroup::")?;
        }
        Ok(())
    }
}

/// Escape a workflow-command message so it stays on one line.
#[must_use]
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(category: EventCategory) -> ActionEvent {
        ActionEvent::new("pulumi_action::test", category)
    }

    fn render_all(events: &[EventCategory]) -> String {
        let mut renderer = ActionsRenderer::new(Vec::new());
        for category in events {
            renderer.render(&event(category.clone())).unwrap();
        }
        renderer.close_group().unwrap();
        String::from_utf8(renderer.out).unwrap()
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50% done\r\nnext"), "50%25 done%0D%0Anext");
        assert_eq!(escape_data("plain"), "plain");
    }

    #[test]
    fn test_stage_groups() {
        let output = render_all(&[
            EventCategory::Pipeline(PipelineEvent::StageStarted {
                stage: "provision".into(),
            }),
            EventCategory::Pipeline(PipelineEvent::Info {
                message: "working".into(),
            }),
            EventCategory::Pipeline(PipelineEvent::StageCompleted {
                stage: "provision".into(),
            }),
        ]);
        assert_eq!(output, "::group::provision\nworking\n::endgroup::\n");
    }

    #[test]
    fn test_unclosed_group_closed_by_next_stage() {
        let output = render_all(&[
            EventCategory::Pipeline(PipelineEvent::StageStarted { stage: "a".into() }),
            EventCategory::Pipeline(PipelineEvent::StageStarted { stage: "b".into() }),
        ]);
        assert_eq!(output, "::group::a\n::endgroup::\n::group::b\n::endgroup::\n");
    }

    #[test]
    fn test_failure_is_annotation_outside_group() {
        let output = render_all(&[
            EventCategory::Pipeline(PipelineEvent::StageStarted {
                stage: "execute".into(),
            }),
            EventCategory::Pipeline(PipelineEvent::Failed {
                message: "stack not found\nstaging".into(),
            }),
        ]);
        assert_eq!(
            output,
            "::group::execute\n::endgroup::\n::error::stack not found%0Astaging\n"
        );
    }

    #[test]
    fn test_output_rendering() {
        let output = render_all(&[
            EventCategory::Output(OutputEvent::Stdout {
                content: "line one\n".into(),
            }),
            EventCategory::Output(OutputEvent::Stdout {
                content: "line two".into(),
            }),
            EventCategory::Output(OutputEvent::Stderr {
                content: "error: 100% broken\n".into(),
            }),
        ]);
        assert_eq!(output, "line one\nline two\n::error::error: 100%25 broken\n");
    }

    #[test]
    fn test_command_events() {
        let output = render_all(&[
            EventCategory::Command(CommandEvent::Started {
                command: "pulumi preview".into(),
            }),
            EventCategory::Command(CommandEvent::Completed {
                command: "pulumi preview".into(),
                exit_code: 0,
            }),
            EventCategory::Command(CommandEvent::Completed {
                command: "pulumi up".into(),
                exit_code: 255,
            }),
        ]);
        assert_eq!(
            output,
            "[command]pulumi preview\n`pulumi up` exited with code 255\n"
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(event(EventCategory::Tool(ToolEvent::Downloading {
            tool: "pulumi".into(),
            url: "https://get.pulumi.com/x.tar.gz".into(),
        })))
        .unwrap();
        tx.send(event(EventCategory::System(SystemEvent::Shutdown)))
            .unwrap();
        tx.send(event(EventCategory::Pipeline(PipelineEvent::Info {
            message: "after shutdown".into(),
        })))
        .unwrap();

        let out = ActionsRenderer::new(Vec::new()).run(rx).await;
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "Downloading pulumi from https://get.pulumi.com/x.tar.gz\n");
    }

    #[tokio::test]
    async fn test_run_ends_when_channel_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(event(EventCategory::Pipeline(PipelineEvent::StageStarted {
            stage: "comment".into(),
        })))
        .unwrap();
        drop(tx);

        let out = ActionsRenderer::new(Vec::new()).run(rx).await;
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "::group::comment\n::endgroup::\n"
        );
    }
}
