// src/exec/capture.rs

//! Run one external process and stream its output into an [`OutputSink`].

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn, Level};

use crate::exec::sink::OutputSink;
use crate::exec::spec::CommandSpec;

/// Why a command did not complete successfully.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The binary could not be launched at all.
    #[error("can not start the command: {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed creating command {0} pipe")]
    MissingStream(&'static str),

    #[error("failed waiting for the command: {0}")]
    Wait(#[source] std::io::Error),

    /// The process ran but did not exit with status 0.
    #[error("{}", describe_exit(.code))]
    ExitStatus { code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Severities applied to the two output streams of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLevels {
    pub stdout: Level,
    pub stderr: Level,
}

impl Default for StreamLevels {
    fn default() -> Self {
        Self {
            stdout: Level::INFO,
            stderr: Level::WARN,
        }
    }
}

/// Spawn `spec`, forward stdout and stderr line by line to `sink`, and wait
/// for the process to exit.
///
/// Each stream gets its own Tokio task so a full stderr pipe can never block
/// the consumption of stdout (and vice versa). Both forwarders are joined
/// after the exit wait, so every line has reached the sink by the time this
/// function returns.
pub async fn execute_and_forward(
    spec: &CommandSpec,
    context: &str,
    levels: StreamLevels,
    sink: Arc<dyn OutputSink>,
) -> Result<ExitStatus, CaptureError> {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.current_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| CaptureError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or(CaptureError::MissingStream("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(CaptureError::MissingStream("stderr"))?;

    let stdout_task = spawn_forwarder(stdout, context, levels.stdout, Arc::clone(&sink));
    let stderr_task = spawn_forwarder(stderr, context, levels.stderr, sink);

    let status = child.wait().await.map_err(CaptureError::Wait)?;

    for (stream, handle) in [("stdout", stdout_task), ("stderr", stderr_task)] {
        if let Err(e) = handle.await {
            warn!(context = %context, stream, error = %e, "output forwarder did not finish cleanly");
        }
    }

    if status.success() {
        return Ok(status);
    }

    let code = status.code();
    if let Some(code) = code {
        debug!(context = "EXIT", "Exit Status: {}", code);
    }

    Err(CaptureError::ExitStatus { code })
}

/// Read `reader` line by line until EOF or the first read error, handing
/// each line to `sink`.
///
/// Lines are split on raw `\n` bytes and decoded lossily, so output that is
/// not valid UTF-8 is still forwarded and the pipe keeps being drained. A
/// read error ends the loop; the exit status alone decides whether the
/// command failed.
fn spawn_forwarder<R>(
    reader: R,
    context: &str,
    level: Level,
    sink: Arc<dyn OutputSink>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let context = context.to_string();

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = trim_line_ending(&buf);
                    sink.line(&context, level, &String::from_utf8_lossy(line));
                }
                Err(e) => {
                    debug!(context = %context, error = %e, "output stream read failed");
                    break;
                }
            }
        }
    })
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
