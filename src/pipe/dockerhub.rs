// src/pipe/dockerhub.rs

//! Minimal Docker Hub API client: log in, then PATCH a repository's README.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LOGIN_URL: &str = "https://hub.docker.com/v2/users/login/";
pub const DEFAULT_ADDRESS: &str = "https://hub.docker.com/v2/repositories";
pub const USER_AGENT: &str = "update-docker-hub-readme";
pub const JSON_REQUEST: &str = "application/json";

/// Docker Hub rejects short descriptions longer than this.
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

#[derive(Error, Debug)]
pub enum DockerHubError {
    #[error("Readme short description can only be 100 characters long while you have: {0}")]
    DescriptionTooLong(usize),

    #[error("Login to Docker Hub failed with code: {0}")]
    LoginFailed(u16),

    #[error("Login to Docker Hub did not return a token")]
    MissingToken,

    #[error("Not logged in to Docker Hub")]
    NotAuthenticated,

    #[error("Response unexpected: {body}")]
    UnexpectedResponse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Uploaded README does not match with current repository README file.")]
    ReadmeMismatch,

    #[error("Repository does not exists: {0}")]
    RepositoryNotFound(String),

    #[error("Given user credentials do not have permission to edit repository: {0}")]
    PermissionDenied(String),

    #[error("Pushing readme failed with code: {0}")]
    UpdateFailed(u16),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: String,
}

/// Body of the README PATCH request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReadmeRequest {
    pub full_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields of the repository returned after a README PATCH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateReadmeResponse {
    pub description: String,
    pub full_description: String,
    pub can_edit: bool,
}

/// Check the short description against Docker Hub's length limit.
pub fn verify_description(description: Option<&str>) -> Result<(), DockerHubError> {
    let len = description.map(|d| d.chars().count()).unwrap_or(0);

    if len > MAX_DESCRIPTION_LENGTH {
        return Err(DockerHubError::DescriptionTooLong(len));
    }

    Ok(())
}

/// Interpret the response to a README PATCH.
///
/// A 200 is only accepted when the returned README (and the description, if
/// one was sent) is byte-for-byte identical to what was uploaded.
pub fn check_update_response(
    status: StatusCode,
    body: &str,
    repository: &str,
    request: &UpdateReadmeRequest,
) -> Result<UpdateReadmeResponse, DockerHubError> {
    let response: UpdateReadmeResponse =
        serde_json::from_str(body).map_err(|source| DockerHubError::UnexpectedResponse {
            body: body.to_string(),
            source,
        })?;

    match status {
        StatusCode::OK => {
            if response.full_description != request.full_description {
                return Err(DockerHubError::ReadmeMismatch);
            }

            if let Some(description) = &request.description {
                if &response.description != description {
                    return Err(DockerHubError::ReadmeMismatch);
                }
            }

            Ok(response)
        }
        StatusCode::NOT_FOUND => Err(DockerHubError::RepositoryNotFound(repository.to_string())),
        _ if !response.can_edit => Err(DockerHubError::PermissionDenied(repository.to_string())),
        other => Err(DockerHubError::UpdateFailed(other.as_u16())),
    }
}

/// Thin wrapper around `reqwest::Client` for the two endpoints the pipe needs.
#[derive(Debug, Clone)]
pub struct DockerHubClient {
    client: Client,
    login_url: String,
    address: String,
}

impl DockerHubClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            address: address.into(),
        }
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Use a preconfigured `reqwest::Client` (proxies, timeouts, TLS roots).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// URL of a repository resource, e.g. `<address>/org/image/`.
    pub fn repository_url(&self, repository: &str) -> String {
        format!("{}/{}/", self.address.trim_end_matches('/'), repository)
    }

    /// Exchange credentials for a JWT.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, DockerHubError> {
        let response = self
            .client
            .post(&self.login_url)
            .header(reqwest::header::CONTENT_TYPE, JSON_REQUEST)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DockerHubError::LoginFailed(status.as_u16()));
        }

        let body: LoginResponse = response.json().await?;
        if body.token.is_empty() {
            return Err(DockerHubError::MissingToken);
        }

        debug!("Authentication token obtained.");

        Ok(body.token)
    }

    /// PATCH the repository README and return the raw status and body.
    pub async fn update_readme(
        &self,
        token: &str,
        repository: &str,
        request: &UpdateReadmeRequest,
    ) -> Result<(StatusCode, String), DockerHubError> {
        let response = self
            .client
            .patch(self.repository_url(repository))
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::CONTENT_TYPE, JSON_REQUEST)
            .header(reqwest::header::AUTHORIZATION, format!("JWT {token}"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!("Status Code: {}", status.as_u16());

        let body = response.text().await?;
        debug!("Response body: {}", body);

        Ok((status, body))
    }
}
