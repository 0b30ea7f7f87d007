// src/engine/task.rs

//! The unit of scheduled work.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::Level;

use crate::exec::{CommandSpec, StreamLevels};

/// Future returned by an inline task function.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// In-process step of a task.
///
/// The function sees the metadata of the task it belongs to and a mutable
/// reference to the pipeline's shared state `S` (e.g. an authentication
/// token obtained by an earlier task).
pub type TaskFn<S> =
    Box<dyn for<'a> Fn(&'a TaskMetadata, &'a mut S) -> TaskFuture<'a> + Send + Sync>;

/// Descriptive part of a task: label, skip flag and output severities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMetadata {
    context: String,
    pub skip: bool,
    /// `None` means "use the default" (INFO).
    pub stdout_level: Option<Level>,
    /// `None` means "use the default" (WARN).
    pub stderr_level: Option<Level>,
}

impl TaskMetadata {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            skip: false,
            stdout_level: None,
            stderr_level: None,
        }
    }

    /// Label used for log correlation and error messages.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn stdout_level(&self) -> Level {
        self.stdout_level.unwrap_or(Level::INFO)
    }

    pub fn stderr_level(&self) -> Level {
        self.stderr_level.unwrap_or(Level::WARN)
    }

    /// Resolved severities for both output streams.
    pub fn stream_levels(&self) -> StreamLevels {
        StreamLevels {
            stdout: self.stdout_level(),
            stderr: self.stderr_level(),
        }
    }

    /// Replace unset severities with their defaults.
    pub(crate) fn normalize_levels(&mut self) {
        self.stdout_level = Some(self.stdout_level());
        self.stderr_level = Some(self.stderr_level());
    }
}

/// A named, skippable unit of work made of inline functions and commands.
///
/// Built with a small builder API:
///
/// ```ignore
/// let task = Task::new("Build")
///     .function(|_meta, state: &mut MyState| Box::pin(async move {
///         state.ready = true;
///         Ok(())
///     }))
///     .command(CommandSpec::new("make").arg("all"));
/// ```
pub struct Task<S> {
    metadata: TaskMetadata,
    function: Option<TaskFn<S>>,
    functions: Vec<TaskFn<S>>,
    command: Option<CommandSpec>,
    commands: Vec<CommandSpec>,
}

impl<S> Task<S> {
    pub fn new(context: impl Into<String>) -> Self {
        Self::from_metadata(TaskMetadata::new(context))
    }

    pub fn from_metadata(metadata: TaskMetadata) -> Self {
        Self {
            metadata,
            function: None,
            functions: Vec::new(),
            command: None,
            commands: Vec::new(),
        }
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.metadata.skip = skip;
        self
    }

    pub fn stdout_level(mut self, level: Level) -> Self {
        self.metadata.stdout_level = Some(level);
        self
    }

    pub fn stderr_level(mut self, level: Level) -> Self {
        self.metadata.stderr_level = Some(level);
        self
    }

    /// Set the primary inline function.
    ///
    /// It runs after every function added with [`Task::functions`].
    pub fn function<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a TaskMetadata, &'a mut S) -> TaskFuture<'a> + Send + Sync + 'static,
    {
        self.function = Some(Box::new(f));
        self
    }

    /// Append an inline function to the ordered function list.
    pub fn push_function<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a TaskMetadata, &'a mut S) -> TaskFuture<'a> + Send + Sync + 'static,
    {
        self.functions.push(Box::new(f));
        self
    }

    /// Append already boxed inline functions.
    pub fn functions(mut self, fns: impl IntoIterator<Item = TaskFn<S>>) -> Self {
        self.functions.extend(fns);
        self
    }

    /// Set the primary command.
    ///
    /// It runs after every command added with [`Task::commands`].
    pub fn command(mut self, command: CommandSpec) -> Self {
        self.command = Some(command);
        self
    }

    pub fn commands(mut self, commands: impl IntoIterator<Item = CommandSpec>) -> Self {
        self.commands.extend(commands);
        self
    }

    pub fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    pub fn context(&self) -> &str {
        self.metadata.context()
    }

    pub fn is_skipped(&self) -> bool {
        self.metadata.skip
    }

    /// Split the task into its metadata and the final execution order of its
    /// functions and commands (primary entries appended last).
    pub(crate) fn into_parts(self) -> (TaskMetadata, Vec<TaskFn<S>>, Vec<CommandSpec>) {
        let Task {
            metadata,
            function,
            mut functions,
            command,
            mut commands,
        } = self;

        functions.extend(function);
        commands.extend(command);

        (metadata, functions, commands)
    }
}

impl<S> fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("metadata", &self.metadata)
            .field("functions", &(self.functions.len() + usize::from(self.function.is_some())))
            .field("command", &self.command)
            .field("commands", &self.commands)
            .finish()
    }
}
