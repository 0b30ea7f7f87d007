// src/errors.rs

//! Crate-wide error type for the pipe binary.

use thiserror::Error;

use crate::engine::PipelineError;

#[derive(Error, Debug)]
pub enum PipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipeError {
    /// Log label under which the error is reported before exiting.
    pub fn log_context(&self) -> &'static str {
        match self {
            PipeError::ConfigError(_) => "CONFIG",
            PipeError::Pipeline(err) => err.log_context(),
            PipeError::Other(_) => "FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipeError>;
