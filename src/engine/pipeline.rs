// src/engine/pipeline.rs

//! Task queue and the runner that drains it.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::engine::task::{Task, TaskFn, TaskMetadata};
use crate::engine::{PipelineError, RunOptions};
use crate::exec::{execute_and_forward, CommandSpec, OutputSink, TracingSink};

/// Ordered queue of pending tasks plus the state they share.
///
/// `S` is whatever the registered task functions need to pass along to one
/// another (credentials, tokens, parsed configuration). The pipeline is an
/// ordinary value owned by the entry point, so two pipelines never share a
/// queue.
pub struct Pipeline<S> {
    queue: VecDeque<Task<S>>,
    state: S,
    sink: Arc<dyn OutputSink>,
}

impl<S> Pipeline<S>
where
    S: Send,
{
    /// Create an empty pipeline that logs process output through `tracing`.
    pub fn new(state: S) -> Self {
        Self::with_sink(state, Arc::new(TracingSink))
    }

    /// Create an empty pipeline that forwards process output to `sink`.
    pub fn with_sink(state: S, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            queue: VecDeque::new(),
            state,
            sink,
        }
    }

    /// Append one task and return the updated queue.
    pub fn add_task(&mut self, task: Task<S>) -> &VecDeque<Task<S>> {
        self.queue.push_back(task);
        &self.queue
    }

    /// Append several tasks, keeping their order, and return the updated queue.
    pub fn add_tasks(&mut self, tasks: impl IntoIterator<Item = Task<S>>) -> &VecDeque<Task<S>> {
        self.queue.extend(tasks);
        &self.queue
    }

    pub fn tasks(&self) -> &VecDeque<Task<S>> {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Drain the queue, running every task in registration order.
    ///
    /// Returns at the first failing inline function or command. The failed
    /// task has already been removed from the queue at that point; tasks
    /// behind it stay queued and are never started.
    ///
    /// An empty queue at invocation is treated as a setup mistake and
    /// reported as [`PipelineError::EmptyQueue`].
    pub async fn run_all(&mut self, _options: RunOptions) -> Result<(), PipelineError> {
        if self.queue.is_empty() {
            return Err(PipelineError::EmptyQueue);
        }

        debug!(tasks = self.queue.len(), "draining task queue");

        while let Some(task) = self.queue.pop_front() {
            let span = info_span!("task", context = %task.context());
            self.run_task(task).instrument(span).await?;
        }

        Ok(())
    }

    async fn run_task(&mut self, task: Task<S>) -> Result<(), PipelineError> {
        let (mut metadata, functions, commands) = task.into_parts();
        metadata.normalize_levels();

        if metadata.skip {
            warn!(context = %metadata.context(), "Task skipped: {}", metadata.context());
            return Ok(());
        }

        self.run_functions(&metadata, &functions).await?;
        self.run_commands(&metadata, commands).await
    }

    async fn run_functions(
        &mut self,
        metadata: &TaskMetadata,
        functions: &[TaskFn<S>],
    ) -> Result<(), PipelineError> {
        for function in functions {
            function(metadata, &mut self.state)
                .await
                .map_err(|source| PipelineError::Task {
                    context: metadata.context().to_string(),
                    source,
                })?;
        }

        Ok(())
    }

    async fn run_commands(
        &self,
        metadata: &TaskMetadata,
        commands: Vec<CommandSpec>,
    ) -> Result<(), PipelineError> {
        for mut command in commands {
            let command_line = command.command_line();
            info!(context = "RUN", "$ {}", command_line);

            command.strip_empty_args();

            execute_and_forward(
                &command,
                metadata.context(),
                metadata.stream_levels(),
                Arc::clone(&self.sink),
            )
            .await
            .map_err(|source| PipelineError::Command {
                command: command_line.clone(),
                source,
            })?;

            info!(context = "FINISH", "{}", command_line);
        }

        Ok(())
    }
}
