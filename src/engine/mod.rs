// src/engine/mod.rs

//! Sequential task engine.
//!
//! A [`Pipeline`] owns an ordered queue of [`Task`]s plus the shared state
//! the tasks operate on. [`Pipeline::run_all`] drains the queue front to
//! back: for every task, inline functions run first, then commands, each
//! command through [`crate::exec::execute_and_forward`].
//!
//! The first failure stops the drain and is returned to the caller; the
//! engine never terminates the process itself.

use thiserror::Error;

use crate::exec::CaptureError;

pub mod pipeline;
pub mod task;

pub use pipeline::Pipeline;
pub use task::{Task, TaskFn, TaskFuture, TaskMetadata};

/// Options for [`Pipeline::run_all`].
///
/// No options are recognized yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {}

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// `run_all` was called before any task was registered.
    #[error("Task list is empty!")]
    EmptyQueue,

    /// An inline function of the task returned an error.
    #[error("$ Task > {context}: {source:#}")]
    Task {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A command could not be started or did not exit successfully.
    #[error("$ {command} > {source}")]
    Command {
        command: String,
        #[source]
        source: CaptureError,
    },
}

impl PipelineError {
    /// Log label under which the error is reported.
    pub fn log_context(&self) -> &'static str {
        match self {
            PipelineError::EmptyQueue => "COMMAND",
            PipelineError::Task { .. } | PipelineError::Command { .. } => "FAILED",
        }
    }
}
