// src/pipe/mod.rs

//! The `update-docker-hub-readme` pipe.
//!
//! Three tasks, run in order on a [`Pipeline<PipeState>`]:
//! 1. `Verify`: check the short description length.
//! 2. `DockerHub - login`: obtain a JWT and keep it in [`PipeState`].
//! 3. `DockerHub - update readme`: PATCH the README and verify the echo.

pub mod dockerhub;

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};

use crate::engine::{Pipeline, Task, TaskMetadata};
use crate::pipe::dockerhub::{
    check_update_response, verify_description, DockerHubClient, DockerHubError,
    UpdateReadmeRequest,
};

/// Settings of the pipe, independent of how they were collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeConfig {
    pub username: String,
    pub password: String,
    pub address: String,
    pub repository: String,
    pub readme_file: PathBuf,
    pub description: Option<String>,
}

/// State shared by the pipe's tasks.
#[derive(Debug)]
pub struct PipeState {
    pub config: PipeConfig,
    pub client: DockerHubClient,
    pub token: Option<String>,
}

impl PipeState {
    pub fn new(config: PipeConfig) -> Self {
        let client = DockerHubClient::new(config.address.clone());
        Self {
            config,
            client,
            token: None,
        }
    }
}

/// Build a pipeline with every task of the pipe registered.
pub fn build_pipeline(config: PipeConfig) -> Pipeline<PipeState> {
    let mut pipeline = Pipeline::new(PipeState::new(config));
    pipeline.add_tasks(tasks());
    pipeline
}

pub fn tasks() -> Vec<Task<PipeState>> {
    vec![
        task_verify_variables(),
        task_login_to_docker_hub(),
        task_update_docker_readme(),
    ]
}

pub fn task_verify_variables() -> Task<PipeState> {
    Task::new("Verify").function(|meta, state| Box::pin(verify_variables(meta, state)))
}

pub fn task_login_to_docker_hub() -> Task<PipeState> {
    Task::new("DockerHub - login").function(|meta, state| Box::pin(login(meta, state)))
}

pub fn task_update_docker_readme() -> Task<PipeState> {
    Task::new("DockerHub - update readme")
        .function(|meta, state| Box::pin(update_readme(meta, state)))
}

async fn verify_variables(_meta: &TaskMetadata, state: &mut PipeState) -> anyhow::Result<()> {
    verify_description(state.config.description.as_deref())?;
    Ok(())
}

async fn login(meta: &TaskMetadata, state: &mut PipeState) -> anyhow::Result<()> {
    let token = state
        .client
        .login(&state.config.username, &state.config.password)
        .await?;
    debug!(context = meta.context(), "Logged in as: {}", state.config.username);

    state.token = Some(token);
    Ok(())
}

async fn update_readme(meta: &TaskMetadata, state: &mut PipeState) -> anyhow::Result<()> {
    let context = meta.context();
    let config = &state.config;

    debug!(context, "Trying to read file: {}", config.readme_file.display());
    let readme = tokio::fs::read_to_string(&config.readme_file)
        .await
        .with_context(|| format!("reading readme file {}", config.readme_file.display()))?;
    debug!(context, "File read: {}", config.readme_file.display());
    debug!(
        context,
        "Running against repository: {}/{}",
        state.client.address(),
        config.repository
    );

    let token = state.token.as_deref().ok_or(DockerHubError::NotAuthenticated)?;
    let request = UpdateReadmeRequest {
        full_description: readme,
        description: config.description.clone().filter(|d| !d.is_empty()),
    };

    let (status, body) = state
        .client
        .update_readme(token, &config.repository, &request)
        .await?;

    check_update_response(status, &body, &config.repository, &request)?;

    info!(
        context,
        "Successfully pushed readme file to: {} -> {}/{}",
        config.readme_file.display(),
        state.client.address(),
        config.repository
    );

    Ok(())
}
