// tests/dockerhub_pipe.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::io::Write;
use std::sync::{Arc, Mutex};

use clap::Parser;
use reqwest::StatusCode;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cicd_pipes::cli::CliArgs;
use cicd_pipes::engine::{Pipeline, PipelineError, RunOptions};
use cicd_pipes::errors::PipeError;
use cicd_pipes::pipe::dockerhub::{
    check_update_response, verify_description, DockerHubClient, DockerHubError,
    UpdateReadmeRequest,
};
use cicd_pipes::pipe::{self, PipeConfig, PipeState};

fn config(readme_file: &std::path::Path, description: Option<&str>) -> PipeConfig {
    PipeConfig {
        username: "ci-bot".to_string(),
        password: "secret".to_string(),
        address: "http://127.0.0.1:9/v2/repositories".to_string(),
        repository: "org/image".to_string(),
        readme_file: readme_file.to_path_buf(),
        description: description.map(str::to_string),
    }
}

fn request(readme: &str, description: Option<&str>) -> UpdateReadmeRequest {
    UpdateReadmeRequest {
        full_description: readme.to_string(),
        description: description.map(str::to_string),
    }
}

#[test]
fn description_length_limit() {
    assert!(verify_description(None).is_ok());
    assert!(verify_description(Some(&"x".repeat(100))).is_ok());

    match verify_description(Some(&"x".repeat(101))) {
        Err(DockerHubError::DescriptionTooLong(len)) => assert_eq!(len, 101),
        other => panic!("expected DescriptionTooLong, got: {other:?}"),
    }
}

#[test]
fn accepted_update_requires_exact_match() {
    let sent = request("# Image\n\nHello.\n", Some("short"));

    let body = r##"{"description":"short","full_description":"# Image\n\nHello.\n","can_edit":true}"##;
    let response = check_update_response(StatusCode::OK, body, "org/image", &sent).unwrap();
    assert_eq!(response.full_description, sent.full_description);

    // Trailing newline dropped by the server.
    let body = r##"{"description":"short","full_description":"# Image\n\nHello.","can_edit":true}"##;
    assert!(matches!(
        check_update_response(StatusCode::OK, body, "org/image", &sent),
        Err(DockerHubError::ReadmeMismatch)
    ));

    let body = r##"{"description":"Short","full_description":"# Image\n\nHello.\n"}"##;
    assert!(matches!(
        check_update_response(StatusCode::OK, body, "org/image", &sent),
        Err(DockerHubError::ReadmeMismatch)
    ));
}

#[test]
fn description_is_not_checked_when_none_was_sent() {
    let sent = request("readme", None);
    let body = r#"{"description":"whatever is on the hub","full_description":"readme"}"#;
    assert!(check_update_response(StatusCode::OK, body, "org/image", &sent).is_ok());
}

#[test]
fn rejected_updates_map_to_errors() {
    let sent = request("readme", None);

    assert!(matches!(
        check_update_response(StatusCode::NOT_FOUND, "{}", "org/image", &sent),
        Err(DockerHubError::RepositoryNotFound(repo)) if repo == "org/image"
    ));
    assert!(matches!(
        check_update_response(StatusCode::FORBIDDEN, r#"{"can_edit":false}"#, "org/image", &sent),
        Err(DockerHubError::PermissionDenied(_))
    ));
    assert!(matches!(
        check_update_response(StatusCode::BAD_GATEWAY, r#"{"can_edit":true}"#, "org/image", &sent),
        Err(DockerHubError::UpdateFailed(502))
    ));
    assert!(matches!(
        check_update_response(StatusCode::OK, "<html>", "org/image", &sent),
        Err(DockerHubError::UnexpectedResponse { .. })
    ));
}

#[test]
fn repository_url_has_single_slashes() {
    let client = DockerHubClient::new("https://hub.docker.com/v2/repositories/");
    assert_eq!(
        client.repository_url("org/image"),
        "https://hub.docker.com/v2/repositories/org/image/"
    );
}

#[test]
fn update_request_omits_missing_description() {
    let json = serde_json::to_value(request("readme", None)).unwrap();
    assert_eq!(json, serde_json::json!({ "full_description": "readme" }));
}

#[test]
fn cli_arguments_become_pipe_config() {
    let args = CliArgs::try_parse_from([
        "update-docker-hub-readme",
        "--docker-hub-username",
        "ci-bot",
        "--docker-hub-password",
        "secret",
        "--readme-repository",
        "/org/image/",
        "--readme-description",
        "",
    ])
    .unwrap();

    let cfg = args.into_config().unwrap();
    assert_eq!(cfg.repository, "org/image");
    assert_eq!(cfg.address, "https://hub.docker.com/v2/repositories");
    assert_eq!(cfg.readme_file, std::path::PathBuf::from("README.md"));
    assert_eq!(cfg.description, None);
}

#[test]
fn blank_repository_is_a_config_error() {
    let args = CliArgs::try_parse_from([
        "update-docker-hub-readme",
        "--docker-hub-username",
        "ci-bot",
        "--docker-hub-password",
        "secret",
        "--readme-repository",
        "  ",
    ])
    .unwrap();

    let err = args.into_config().unwrap_err();
    assert!(matches!(err, PipeError::ConfigError(_)));
    assert_eq!(err.log_context(), "CONFIG");
}

#[test]
fn pipe_registers_three_tasks_in_order() {
    let readme = NamedTempFile::new().unwrap();
    let pipeline = pipe::build_pipeline(config(readme.path(), None));

    let contexts: Vec<&str> = pipeline.tasks().iter().map(|t| t.context()).collect();
    assert_eq!(
        contexts,
        vec!["Verify", "DockerHub - login", "DockerHub - update readme"]
    );
}

#[tokio::test]
async fn too_long_description_fails_before_login() {
    init_tracing();

    let readme = NamedTempFile::new().unwrap();
    let long = "d".repeat(120);
    let mut pipeline = pipe::build_pipeline(config(readme.path(), Some(&long)));

    let err = with_timeout(pipeline.run_all(RunOptions::default()))
        .await
        .expect_err("verify should fail");

    match err {
        PipelineError::Task { context, source } => {
            assert_eq!(context, "Verify");
            assert!(matches!(
                source.downcast_ref::<DockerHubError>(),
                Some(DockerHubError::DescriptionTooLong(120))
            ));
        }
        other => panic!("expected task error, got: {other:?}"),
    }

    assert_eq!(pipeline.len(), 2);
    assert_eq!(pipeline.state().token, None);
}

#[tokio::test]
async fn update_without_login_is_rejected() {
    init_tracing();

    let mut readme = NamedTempFile::new().unwrap();
    write!(readme, "# Hello").unwrap();

    let mut pipeline = Pipeline::new(PipeState::new(config(readme.path(), None)));
    pipeline.add_task(pipe::task_update_docker_readme());

    let err = with_timeout(pipeline.run_all(RunOptions::default()))
        .await
        .expect_err("update should fail");

    match err {
        PipelineError::Task { source, .. } => assert!(matches!(
            source.downcast_ref::<DockerHubError>(),
            Some(DockerHubError::NotAuthenticated)
        )),
        other => panic!("expected task error, got: {other:?}"),
    }
}

/// A request seen by [`serve_hub`].
#[derive(Debug, Clone)]
struct SeenRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

/// Minimal HTTP/1.1 stand-in for Docker Hub.
///
/// Answers the login endpoint with a fixed token and echoes README updates,
/// optionally replacing the echoed README with `echo_override`.
async fn serve_hub(
    echo_override: Option<&'static str>,
) -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_server = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let request = read_request(&mut stream).await;
            seen_in_server.lock().unwrap().push(request.clone());

            let (status, body) = match (request.method.as_str(), request.path.as_str()) {
                ("POST", "/v2/users/login/") => ("200 OK", r#"{"token":"jwt-123"}"#.to_string()),
                ("PATCH", "/v2/repositories/org/image/") => {
                    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
                    let readme = echo_override
                        .map(str::to_string)
                        .unwrap_or_else(|| sent["full_description"].as_str().unwrap().to_string());
                    let echoed = serde_json::json!({
                        "description": sent.get("description").cloned().unwrap_or_else(|| serde_json::json!("")),
                        "full_description": readme,
                        "can_edit": true,
                    });
                    ("200 OK", echoed.to_string())
                }
                _ => ("404 Not Found", "{}".to_string()),
            };

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (base, seen)
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> SeenRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap().split_whitespace();
    let method = request_line.next().unwrap().to_string();
    let path = request_line.next().unwrap().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap(),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    SeenRequest {
        method,
        path,
        authorization,
        body: String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string(),
    }
}

fn pipeline_against(base: &str, readme: &std::path::Path, description: Option<&str>) -> Pipeline<PipeState> {
    let mut cfg = config(readme, description);
    cfg.address = format!("{base}/v2/repositories");

    let mut state = PipeState::new(cfg);
    state.client = state
        .client
        .clone()
        .with_login_url(format!("{base}/v2/users/login/"))
        .with_http_client(reqwest::Client::builder().no_proxy().build().unwrap());

    let mut pipeline = Pipeline::new(state);
    pipeline.add_tasks(pipe::tasks());
    pipeline
}

#[tokio::test]
async fn full_pipe_logs_in_and_pushes_readme() {
    init_tracing();

    let (base, seen) = serve_hub(None).await;
    let mut readme = NamedTempFile::new().unwrap();
    write!(readme, "# Image\n\nUsage notes.\n").unwrap();

    let mut pipeline = pipeline_against(&base, readme.path(), Some("An image"));
    with_timeout(pipeline.run_all(RunOptions::default()))
        .await
        .expect("pipe should succeed");

    assert!(pipeline.is_empty());
    assert_eq!(pipeline.state().token.as_deref(), Some("jwt-123"));

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);

    assert_eq!(seen[0].method, "POST");
    let login: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(login, serde_json::json!({ "username": "ci-bot", "password": "secret" }));

    assert_eq!(seen[1].method, "PATCH");
    assert_eq!(seen[1].authorization.as_deref(), Some("JWT jwt-123"));
    let update: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
    assert_eq!(
        update,
        serde_json::json!({
            "full_description": "# Image\n\nUsage notes.\n",
            "description": "An image",
        })
    );
}

#[tokio::test]
async fn mismatching_echo_fails_the_pipe() {
    init_tracing();

    let (base, _seen) = serve_hub(Some("something else")).await;
    let mut readme = NamedTempFile::new().unwrap();
    write!(readme, "# Image").unwrap();

    let mut pipeline = pipeline_against(&base, readme.path(), None);
    let err = with_timeout(pipeline.run_all(RunOptions::default()))
        .await
        .expect_err("pipe should fail");

    match err {
        PipelineError::Task { context, source } => {
            assert_eq!(context, "DockerHub - update readme");
            assert!(matches!(
                source.downcast_ref::<DockerHubError>(),
                Some(DockerHubError::ReadmeMismatch)
            ));
        }
        other => panic!("expected task error, got: {other:?}"),
    }
}
