//! Core types for pulumi-action.
//!
//! This crate holds everything the pipeline needs that does not talk to a
//! specific host or download source:
//! - [`Config`] and [`EventContext`], the explicit inputs of a run
//! - stack resolution from the branch mapping file
//! - the subprocess [`Executor`] and its [`CommandRunner`] seam
//! - the [`VersionSource`], [`ToolInstaller`] and [`CommentSink`] seams
//!   implemented by the provider crates

pub mod comment;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod install;
pub mod stack;
pub mod tools;

pub use comment::{CommentRequest, CommentSink, format_comment_body};
pub use config::{Config, Mode};
pub use context::{EventContext, Trigger};
pub use credentials::CredentialFile;
pub use error::{Error, Result};
pub use executor::{CommandRunner, CommandSpec, ExecutionOptions, ExecutionResult, Executor};
pub use install::PackageManager;
pub use stack::{StackMapping, normalize_branch, resolve_stack};
pub use tools::{ToolInstaller, ToolVersion, VersionSource};
