// src/exec/sink.rs

//! Destinations for captured process output.
//!
//! Stream capture hands every line it reads to an [`OutputSink`] instead of
//! calling the logger directly. Production code uses [`TracingSink`]; tests
//! can plug in a sink that records lines so they can assert on exact counts
//! and severities.

use tracing::{debug, error, info, trace, warn, Level};

/// Receiver for line-delimited process output.
///
/// Implementations are shared between the stdout and stderr forwarding
/// tasks, so they must be thread-safe.
pub trait OutputSink: Send + Sync {
    /// Emit one line of output produced by the task labelled `context`.
    ///
    /// `line` has its trailing newline already removed.
    fn line(&self, context: &str, level: Level, line: &str);
}

/// Default sink: every line becomes a `tracing` event at the requested level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn line(&self, context: &str, level: Level, line: &str) {
        // `tracing` macros need a static level.
        if level == Level::ERROR {
            error!(context = %context, "{}", line);
        } else if level == Level::WARN {
            warn!(context = %context, "{}", line);
        } else if level == Level::INFO {
            info!(context = %context, "{}", line);
        } else if level == Level::DEBUG {
            debug!(context = %context, "{}", line);
        } else {
            trace!(context = %context, "{}", line);
        }
    }
}
