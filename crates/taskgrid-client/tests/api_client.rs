//! HTTP-level behaviour of the API client and service modules.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use httpmock::prelude::*;
use serde_json::json;
use taskgrid_api_models::{CreateTaskRequest, LoginRequest, TaskStatus};
use taskgrid_client::{
    ApiClient, ApiError, AuthApi, ClientService, ErrorKind, FileApi, FileService, FileUpload,
    HEADER_REQUEST_ID, LocalSessionStore, SessionEvent, TaskApi, TaskService, WorkerApi,
    WorkerService,
};
use taskgrid_core::{SessionStore, StoredSession};
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    session: Arc<LocalSessionStore>,
    client: ApiClient,
}

fn harness(server: &MockServer, token: Option<&str>) -> Result<Harness> {
    let dir = tempfile::tempdir()?;
    let session = Arc::new(LocalSessionStore::in_dir(dir.path()));
    if let Some(token) = token {
        session.save(&StoredSession::with_token(token))?;
    }
    let base = server.url("/api").parse()?;
    let client = ApiClient::new(base, Duration::from_secs(5), session.clone())?;
    Ok(Harness {
        _dir: dir,
        session,
        client,
    })
}

fn task_json(status: &str) -> serde_json::Value {
    json!({
        "task_id": "t-1",
        "function_id": "sum",
        "user_id": "u-1",
        "file_url": "/files/data.csv",
        "task_status": status,
        "subtask_list": [],
        "retry_times": 0,
        "current_round": 1,
        "max_rounds": 2,
        "task_volume": 100,
        "created_at": "2026-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn bearer_token_and_request_id_are_attached() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/workers/status")
                .header("authorization", "Bearer tok-1")
                .header_exists(HEADER_REQUEST_ID);
            then.status(200).json_body(json!({
                "success": true,
                "workers": [{
                    "worker_id": "w-1",
                    "client_id": "c-1",
                    "cpu_usage_percent": 12.5,
                    "memory_usage_percent": 40.0,
                    "vram_usage_percent": 0.0,
                    "last_heartbeat": "2026-01-01T00:00:00Z"
                }]
            }));
        })
        .await;

    let harness = harness(&server, Some("tok-1"))?;
    let response = WorkerService::new(harness.client.clone()).list_workers().await?;
    mock.assert_async().await;
    assert_eq!(response.workers.len(), 1);
    assert_eq!(response.workers[0].worker_id, "w-1");
    Ok(())
}

#[tokio::test]
async fn requests_without_session_carry_no_authorization() -> Result<()> {
    let server = MockServer::start_async().await;
    let authorized = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/clients").header_exists("authorization");
            then.status(500);
        })
        .await;
    let anonymous = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/clients");
            then.status(200).json_body(json!({
                "success": true,
                "clients": [{"client_id": "c-1", "name": "Acme", "created_at": "2026-01-01"}]
            }));
        })
        .await;

    let harness = harness(&server, None)?;
    let clients = ClientService::new(harness.client.clone()).list_clients().await?;
    assert_eq!(clients.len(), 1);
    assert_eq!(authorized.calls_async().await, 0);
    anonymous.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn login_401_is_invalid_credentials_and_keeps_session() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/user/login");
            then.status(401).json_body(json!({"message": "bad password"}));
        })
        .await;

    let harness = harness(&server, Some("existing"))?;
    let mut events = harness.client.subscribe_session_events();
    let err = ClientService::new(harness.client.clone())
        .login(&LoginRequest {
            email: "ops@example.com".into(),
            password: "wrong".into(),
        })
        .await
        .err()
        .ok_or_else(|| anyhow!("login should fail"))?;

    assert!(matches!(err, ApiError::InvalidCredentials { .. }));
    assert_eq!(err.user_message(), "Incorrect email or password");
    assert!(harness.session.load()?.is_some());
    assert!(events.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn expired_token_clears_session_and_broadcasts() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/files");
            then.status(401);
        })
        .await;

    let harness = harness(&server, Some("stale"))?;
    let mut events = harness.client.subscribe_session_events();
    let err = FileService::new(harness.client.clone())
        .list()
        .await
        .err()
        .ok_or_else(|| anyhow!("list should fail"))?;

    assert!(matches!(err, ApiError::SessionExpired { .. }));
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(harness.session.load()?, None);
    assert_eq!(events.recv().await?, SessionEvent::Expired);
    Ok(())
}

#[tokio::test]
async fn validation_errors_carry_backend_message() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/task/execute")
                .json_body(json!({"function_id": ""}));
            then.status(422)
                .json_body(json!({"error": "function_id must not be empty"}));
        })
        .await;

    let harness = harness(&server, Some("tok"))?;
    let err = TaskService::new(harness.client.clone())
        .execute(&CreateTaskRequest {
            function_id: String::new(),
        })
        .await
        .err()
        .ok_or_else(|| anyhow!("execute should fail"))?;

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.user_message(), "function_id must not be empty");
    Ok(())
}

#[tokio::test]
async fn fixed_statuses_map_to_fixed_kinds() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/task/status/missing");
            then.status(404).json_body(json!({"message": "ignored"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/task/status/locked");
            then.status(403);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(503);
        })
        .await;

    let harness = harness(&server, Some("tok"))?;
    let tasks = TaskService::new(harness.client.clone());

    let missing = tasks.status("missing").await.err().ok_or_else(|| anyhow!("404"))?;
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    assert_eq!(missing.user_message(), "The requested resource does not exist");

    let locked = tasks.status("locked").await.err().ok_or_else(|| anyhow!("403"))?;
    assert_eq!(locked.kind(), ErrorKind::Authorization);

    let unavailable = tasks.list().await.err().ok_or_else(|| anyhow!("503"))?;
    assert_eq!(unavailable.kind(), ErrorKind::Transient);
    assert_eq!(
        unavailable.user_message(),
        "Service temporarily unavailable, please try again later"
    );
    Ok(())
}

#[tokio::test]
async fn task_status_unwraps_envelope() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/task/status/t-1");
            then.status(200).json_body(json!({
                "success": true,
                "message": "",
                "task": task_json("running")
            }));
        })
        .await;

    let harness = harness(&server, Some("tok"))?;
    let task = TaskService::new(harness.client.clone()).status("t-1").await?;
    assert_eq!(task.task_status, TaskStatus::Running);
    assert_eq!(task.max_rounds, 2);
    Ok(())
}

#[tokio::test]
async fn upload_and_delete_hit_file_endpoints() -> Result<()> {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/file/upload");
            then.status(200).json_body(json!({
                "success": true,
                "message": "uploaded",
                "file_id": "f-1",
                "file_url": "/files/f-1"
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/files/f-1");
            then.status(200).json_body(json!({"success": true, "message": "deleted"}));
        })
        .await;

    let harness = harness(&server, Some("tok"))?;
    let files = FileService::new(harness.client.clone());
    let uploaded = files
        .upload(FileUpload::new("data.csv", b"a,b\n1,2\n".to_vec()))
        .await?;
    assert_eq!(uploaded.file_id, "f-1");
    let ack = files.delete("f-1").await?;
    assert!(ack.success);

    upload.assert_async().await;
    delete.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let session = Arc::new(LocalSessionStore::in_dir(dir.path()));
    let client = ApiClient::new(
        "http://127.0.0.1:9/api".parse()?,
        Duration::from_secs(2),
        session,
    )?;
    let err = WorkerService::new(client)
        .list_workers()
        .await
        .err()
        .ok_or_else(|| anyhow!("request should fail"))?;
    assert_eq!(err.kind(), ErrorKind::Transient);
    Ok(())
}
