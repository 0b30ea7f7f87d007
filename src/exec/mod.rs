// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`spec`] describes a command to run (`CommandSpec`).
//! - [`capture`] spawns the process with `tokio::process::Command` and
//!   forwards both output streams, line by line, while waiting for exit.
//! - [`sink`] provides the `OutputSink` trait those lines are sent to, and
//!   the `TracingSink` used in production.

pub mod capture;
pub mod sink;
pub mod spec;

pub use capture::{execute_and_forward, CaptureError, StreamLevels};
pub use sink::{OutputSink, TracingSink};
pub use spec::CommandSpec;
