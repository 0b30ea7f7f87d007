// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every pipe setting can also come from the environment, which is how CI
//! systems usually hand configuration to a pipe container.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::errors::{PipeError, Result};
use crate::pipe::dockerhub::DEFAULT_ADDRESS;
use crate::pipe::PipeConfig;

/// Command-line arguments for `update-docker-hub-readme`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "update-docker-hub-readme",
    version,
    about = "Push a README file to a Docker Hub repository.",
    long_about = None
)]
pub struct CliArgs {
    /// Docker Hub username.
    #[arg(long, env = "DOCKER_USERNAME", value_name = "USER")]
    pub docker_hub_username: String,

    /// Docker Hub password or access token.
    #[arg(long, env = "DOCKER_PASSWORD", value_name = "PASSWORD", hide_env_values = true)]
    pub docker_hub_password: String,

    /// Base URL of the Docker Hub repositories API.
    #[arg(long, env = "DOCKER_HUB_ADDRESS", value_name = "URL", default_value = DEFAULT_ADDRESS)]
    pub docker_hub_address: String,

    /// Repository to update, e.g. `org/image`.
    #[arg(long, env = "README_REPOSITORY", value_name = "REPO")]
    pub readme_repository: String,

    /// README file to upload.
    #[arg(long, env = "README_FILE", value_name = "PATH", default_value = "README.md")]
    pub readme_file: PathBuf,

    /// Short repository description (at most 100 characters).
    #[arg(long, env = "README_DESCRIPTION", value_name = "TEXT")]
    pub readme_description: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Validate the arguments and turn them into the pipe's configuration.
    pub fn into_config(self) -> Result<PipeConfig> {
        let repository = self.readme_repository.trim().trim_matches('/').to_string();
        if repository.is_empty() {
            return Err(PipeError::ConfigError(
                "readme repository must not be empty".to_string(),
            ));
        }

        if self.docker_hub_username.trim().is_empty() {
            return Err(PipeError::ConfigError(
                "docker hub username must not be empty".to_string(),
            ));
        }

        Ok(PipeConfig {
            username: self.docker_hub_username,
            password: self.docker_hub_password,
            address: self.docker_hub_address,
            repository,
            readme_file: self.readme_file,
            description: self.readme_description.filter(|d| !d.is_empty()),
        })
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
