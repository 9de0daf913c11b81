//! Subprocess execution with streamed, optionally captured output.
//!
//! - stdout is forwarded to the event stream chunk by chunk and, when asked,
//!   accumulated in arrival order
//! - stderr is forwarded as error output and never captured
//! - every child sees the provisioned tool directories first on `PATH`

use crate::{Error, Result};
use async_trait::async_trait;
use pulumi_action_events::{emit_command_completed, emit_command_started, emit_stderr, emit_stdout};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// A program with an explicit argument list.
    Program {
        /// Program name or path.
        program: String,
        /// Arguments, passed verbatim.
        args: Vec<String>,
    },
    /// A command line interpreted by the platform shell.
    Shell(String),
}

impl CommandSpec {
    /// A program with arguments.
    pub fn program(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Program {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A shell command line.
    pub fn shell(line: impl Into<String>) -> Self {
        Self::Shell(line.into())
    }

    fn to_command(&self) -> Command {
        match self {
            Self::Program { program, args } => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            #[cfg(windows)]
            Self::Shell(line) => {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").arg(line);
                cmd
            }
            #[cfg(not(windows))]
            Self::Shell(line) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(line);
                cmd
            }
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Self::Shell(line) => write!(f, "{line}"),
        }
    }
}

/// Per-invocation execution switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Accumulate stdout into [`ExecutionResult::output`].
    pub capture_output: bool,
    /// Return non-zero exits as results instead of errors.
    pub ignore_non_zero_exit: bool,
}

impl ExecutionOptions {
    /// Fail on non-zero exit, capture nothing.
    pub const CHECKED: Self = Self {
        capture_output: false,
        ignore_non_zero_exit: false,
    };

    /// Capture stdout and report any exit code as a result.
    pub const CAPTURE_ANY_EXIT: Self = Self {
        capture_output: true,
        ignore_non_zero_exit: true,
    };
}

/// Outcome of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Exit code; 1 when the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout, empty unless capture was requested.
    pub output: String,
}

/// Runs subprocesses for the pipeline.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Put `dir` in front of the search path for all later commands.
    fn prepend_path(&self, dir: &Path);

    /// Run `command` to completion.
    async fn run(&self, command: &CommandSpec, options: ExecutionOptions)
    -> Result<ExecutionResult>;
}

/// Host process executor.
#[derive(Debug)]
pub struct Executor {
    working_dir: PathBuf,
    search_path: Mutex<Vec<PathBuf>>,
    inherited_path: Option<OsString>,
    env: Vec<(String, String)>,
}

impl Executor {
    /// Executor running commands in `working_dir` with the inherited `PATH`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            search_path: Mutex::new(Vec::new()),
            inherited_path: std::env::var_os("PATH"),
            env: Vec::new(),
        }
    }

    /// Add environment variables applied to every child.
    #[must_use]
    pub fn with_env(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// Directories prepended so far, most recent first.
    #[must_use]
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.search_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn child_path(&self) -> Option<OsString> {
        let mut dirs = self.search_path();
        if dirs.is_empty() {
            return None;
        }
        if let Some(inherited) = &self.inherited_path {
            dirs.extend(std::env::split_paths(inherited));
        }
        std::env::join_paths(dirs).ok()
    }
}

#[async_trait]
impl CommandRunner for Executor {
    fn prepend_path(&self, dir: &Path) {
        let mut dirs = self
            .search_path
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        dirs.retain(|d| d != dir);
        dirs.insert(0, dir.to_path_buf());
    }

    async fn run(
        &self,
        command: &CommandSpec,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult> {
        let command_line = command.to_string();
        emit_command_started!(command_line);
        tracing::debug!(command = %command_line, cwd = %self.working_dir.display(), "spawning");

        let mut cmd = command.to_command();
        cmd.current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.child_path() {
            cmd.env("PATH", path);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::io(
                e,
                Some(self.working_dir.clone()),
                format!("spawning `{command_line}`"),
            )
        })?;

        let stdout = child.stdout.take().ok_or_else(|| pipe_unavailable("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| pipe_unavailable("stderr"))?;

        let capture = options.capture_output;
        let stdout_task = drain(BufReader::new(stdout), |chunk, captured| {
            emit_stdout!(chunk);
            if capture {
                captured.push_str(chunk);
            }
        });
        let stderr_task = drain(BufReader::new(stderr), |chunk, _| {
            emit_stderr!(chunk);
        });

        let (output, _, status) = tokio::join!(stdout_task, stderr_task, child.wait());
        let status = status.map_err(|e| Error::io(e, None, format!("waiting for `{command_line}`")))?;

        let exit_code = status.code().unwrap_or(1);
        emit_command_completed!(command_line, exit_code);

        if exit_code != 0 && !options.ignore_non_zero_exit {
            return Err(Error::subprocess(command_line, exit_code));
        }
        Ok(ExecutionResult { exit_code, output })
    }
}

fn pipe_unavailable(stream: &str) -> Error {
    Error::io(
        std::io::Error::other(format!("{stream} pipe not available")),
        None,
        format!("capturing {stream}"),
    )
}

/// Read newline-delimited chunks until EOF, handing each to `on_chunk`.
async fn drain<R, F>(mut reader: R, mut on_chunk: F) -> String
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&str, &mut String),
{
    let mut captured = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = String::from_utf8_lossy(&buf);
                on_chunk(chunk.as_ref(), &mut captured);
            }
            Err(e) => {
                tracing::warn!(error = %e, "stopped reading subprocess output");
                break;
            }
        }
    }
    captured
}
