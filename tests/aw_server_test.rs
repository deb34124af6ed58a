//! Integration tests against a mock ActivityWatch server

use aw_watcher_editor::editor::{EditorSnapshot, HostEditorState, NoVcs};
use aw_watcher_editor::{
    AwClient, Bucket, ClientError, Config, HeartbeatData, HeartbeatSample, LogReporter, Outcome,
    TrackingClient, Watcher,
};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct MockServer {
    buckets: Arc<Mutex<Vec<(String, Value)>>>,
    heartbeats: Arc<Mutex<Vec<(String, f64, Value)>>>,
}

impl MockServer {
    fn buckets(&self) -> Vec<(String, Value)> {
        self.buckets.lock().unwrap().clone()
    }

    fn heartbeats(&self) -> Vec<(String, f64, Value)> {
        self.heartbeats.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct HeartbeatQuery {
    pulsetime: f64,
}

async fn create_bucket(
    State(server): State<MockServer>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    if id.starts_with("broken") {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    let mut buckets = server.buckets.lock().unwrap();
    if buckets.iter().any(|(existing, _)| existing == &id) {
        return StatusCode::NOT_MODIFIED;
    }
    buckets.push((id, body));
    StatusCode::OK
}

async fn heartbeat(
    State(server): State<MockServer>,
    Path(id): Path<String>,
    Query(query): Query<HeartbeatQuery>,
    Json(event): Json<Value>,
) -> Json<Value> {
    server
        .heartbeats
        .lock()
        .unwrap()
        .push((id, query.pulsetime, event.clone()));
    Json(event)
}

async fn start_mock_server() -> (SocketAddr, MockServer) {
    let server = MockServer::default();
    let app = Router::new()
        .route("/api/0/buckets/:id", post(create_bucket))
        .route("/api/0/buckets/:id/heartbeat", post(heartbeat))
        .with_state(server.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock server");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock server failed");
    });

    (addr, server)
}

fn sample(file: &str) -> HeartbeatSample {
    HeartbeatSample::now(HeartbeatData::new(
        Some("rust".to_string()),
        Some("/work/app".to_string()),
        Some(file.to_string()),
        Some("main".to_string()),
    ))
}

#[tokio::test]
async fn test_ensure_bucket_created_then_existing() {
    let (addr, server) = start_mock_server().await;
    let client = AwClient::new(format!("http://{addr}"), "aw-watcher-vscode-vscode").unwrap();

    let first = client
        .ensure_bucket("aw-watcher-vscode-vscode_devbox", "app.editor.activity", "devbox")
        .await
        .expect("Failed to create bucket");
    assert!(!first.already_existed);

    let second = client
        .ensure_bucket("aw-watcher-vscode-vscode_devbox", "app.editor.activity", "devbox")
        .await
        .expect("Failed to ensure bucket");
    assert!(second.already_existed);

    let buckets = server.buckets();
    assert_eq!(buckets.len(), 1);
    let (id, body) = &buckets[0];
    assert_eq!(id, "aw-watcher-vscode-vscode_devbox");
    assert_eq!(body["client"], "aw-watcher-vscode-vscode");
    assert_eq!(body["type"], "app.editor.activity");
    assert_eq!(body["hostname"], "devbox");
}

#[tokio::test]
async fn test_heartbeat_carries_pulsetime_and_event() {
    let (addr, server) = start_mock_server().await;
    let client = AwClient::new(format!("http://{addr}"), "aw-watcher-vscode-vscode").unwrap();

    client
        .heartbeat("bucket", 20.0, &sample("/work/app/src/main.rs"))
        .await
        .expect("Failed to send heartbeat");

    let heartbeats = server.heartbeats();
    assert_eq!(heartbeats.len(), 1);
    let (id, pulsetime, event) = &heartbeats[0];
    assert_eq!(id, "bucket");
    assert_eq!(*pulsetime, 20.0);
    assert_eq!(event["duration"], 0.0);
    assert_eq!(event["data"]["file"], "/work/app/src/main.rs");
    assert_eq!(event["data"]["branch"], "main");
    assert!(event["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let (addr, _server) = start_mock_server().await;
    let client = AwClient::new(format!("http://{addr}"), "aw-watcher-vscode-vscode").unwrap();

    let result = client
        .ensure_bucket("broken_devbox", "app.editor.activity", "devbox")
        .await;
    assert!(matches!(result, Err(ClientError::Server { status: 500, .. })));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind and release a port so nothing is listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = AwClient::new(format!("http://{addr}"), "aw-watcher-vscode-vscode").unwrap();
    let result = client
        .ensure_bucket("bucket", "app.editor.activity", "devbox")
        .await;
    assert!(matches!(result, Err(ClientError::Network(_))));
}

#[tokio::test]
async fn test_watcher_end_to_end() {
    let (addr, server) = start_mock_server().await;
    let config = Config {
        server_port: Some(addr.port()),
        ..Config::default()
    };
    let bucket = Bucket::new("Visual Studio Code", "devbox", None);
    let client = AwClient::new(config.server_url(), bucket.client_name.clone()).unwrap();

    let mut watcher = Watcher::new(
        "Visual Studio Code",
        bucket,
        Arc::new(client),
        HostEditorState::new(),
        NoVcs,
        Arc::new(LogReporter),
        tokio::runtime::Handle::current(),
    );

    watcher.editor_mut().apply(&EditorSnapshot {
        file: Some("/work/app/src/main.rs".to_string()),
        language: Some("rust".to_string()),
        workspace: Some("/work/app".to_string()),
    });
    assert!(matches!(watcher.on_activity(), Outcome::NotReady));

    watcher.init(&config).await.unwrap();
    assert!(watcher.registrar().is_ready());

    match watcher.on_activity() {
        Outcome::Sent(handle) => handle.await.unwrap(),
        other => panic!("expected a heartbeat, got {other:?}"),
    }
    assert!(matches!(watcher.on_activity(), Outcome::Throttled));

    watcher.editor_mut().apply(&EditorSnapshot {
        file: Some("/work/app/src/lib.rs".to_string()),
        language: Some("rust".to_string()),
        workspace: Some("/work/app".to_string()),
    });
    match watcher.on_activity() {
        Outcome::Sent(handle) => handle.await.unwrap(),
        other => panic!("expected a heartbeat, got {other:?}"),
    }

    let heartbeats = server.heartbeats();
    assert_eq!(heartbeats.len(), 2);
    assert!(heartbeats
        .iter()
        .all(|(id, _, _)| id == "aw-watcher-vscode-vscode_devbox"));
    assert_eq!(heartbeats[0].2["data"]["file"], "/work/app/src/main.rs");
    assert_eq!(heartbeats[0].2["data"]["project"], "/work/app");
    assert_eq!(heartbeats[0].2["data"]["branch"], "unknown");
    assert_eq!(heartbeats[1].2["data"]["file"], "/work/app/src/lib.rs");
    assert_eq!(watcher.stats().snapshot().heartbeats_sent, 2);
}
