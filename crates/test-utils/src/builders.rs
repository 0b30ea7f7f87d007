use cicd_pipes::engine::Task;
use cicd_pipes::exec::CommandSpec;

/// Shared state used by engine tests: every inline function appends an entry.
pub type ExecutionLog = Vec<String>;

/// A task whose single inline function records `"<context>:fn"`.
pub fn recording_task(context: &str) -> Task<ExecutionLog> {
    Task::new(context).function(|meta, log: &mut ExecutionLog| {
        let entry = format!("{}:fn", meta.context());
        Box::pin(async move {
            log.push(entry);
            Ok(())
        })
    })
}

/// A task whose inline function always fails with `message`.
pub fn failing_task(context: &str, message: &'static str) -> Task<ExecutionLog> {
    Task::new(context).function(move |_meta, _log: &mut ExecutionLog| {
        Box::pin(async move { Err(anyhow::anyhow!(message)) })
    })
}

/// `sh -c <script>`.
pub fn shell(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}
