// src/lib.rs

pub mod cli;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipe;

use tracing::debug;

use crate::cli::CliArgs;
use crate::engine::RunOptions;
use crate::errors::Result;

/// High-level entry point used by `main.rs`.
///
/// Builds the Docker Hub README pipeline from the CLI arguments and drains
/// it. Any error is returned untouched so `main` can report it once.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = args.into_config()?;
    debug!(repository = %config.repository, file = %config.readme_file.display(), "pipe configured");

    let mut pipeline = pipe::build_pipeline(config);
    pipeline.run_all(RunOptions::default()).await?;

    Ok(())
}
