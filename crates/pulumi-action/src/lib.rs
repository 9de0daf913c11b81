//! pulumi-action: run Pulumi from a GitHub Actions workflow.
//!
//! The binary parses action inputs ([`cli`]), wires the provider crates into
//! [`PipelineServices`], and runs the [`Pipeline`] once for the triggering
//! event. Workflow log output is produced by the events renderer; stderr only
//! carries diagnostics ([`tracing`]).

pub mod cli;
pub mod pipeline;
pub mod tracing;

pub use pipeline::{Pipeline, PipelineOutcome, PipelineServices, Stage};
