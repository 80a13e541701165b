//! Integration tests for [`DockerClient`] against an in-process Engine
//! API emulator.
//!
//! The emulator models just enough daemon state (created / started /
//! removed containers) to exercise the full lifecycle and the error
//! mappings the pipeline depends on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use reviewdock_docker::{
    archive, BackendError, ContainerBackend, ContainerId, ContainerSpec, DockerClient,
    DockerConfig, RemoveOptions,
};

const BLOCK_SIZE: usize = 512;

/// In-memory daemon state shared across handlers.
#[derive(Default)]
struct DaemonState {
    next_id: AtomicU64,
    /// Container id -> running flag.
    containers: Mutex<HashMap<String, bool>>,
    /// File name -> payload, served by the archive endpoint.
    files: Mutex<HashMap<String, Vec<u8>>>,
}

type SharedState = Arc<DaemonState>;

async fn create_container(
    State(state): State<SharedState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let image = body["Image"].as_str().unwrap_or_default();
    if image == "conflict/image:latest" {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"message": "name already in use"})),
        )
            .into_response();
    }

    let id = format!("c{:016x}", state.next_id.fetch_add(1, Ordering::SeqCst));
    state.containers.lock().unwrap().insert(id.clone(), false);
    (StatusCode::CREATED, Json(serde_json::json!({"Id": id}))).into_response()
}

async fn start_container(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut containers = state.containers.lock().unwrap();
    match containers.get_mut(&id) {
        Some(running) if *running => StatusCode::NOT_MODIFIED,
        Some(running) => {
            *running = true;
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn wait_container(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // The emulator's containers exit immediately.
    if let Some(running) = state.containers.lock().unwrap().get_mut(&id) {
        *running = false;
    }
    if id.ends_with("wait-error") {
        return Json(serde_json::json!({
            "StatusCode": -1,
            "Error": {"Message": "daemon went away"},
        }));
    }
    Json(serde_json::json!({"StatusCode": 0}))
}

async fn copy_archive(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let path = params.get("path").cloned().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default().to_string();

    let files = state.files.lock().unwrap();
    match files.get(&name) {
        Some(payload) => (StatusCode::OK, make_archive(&name, payload)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"message": "no such file"})),
        )
            .into_response(),
    }
}

async fn remove_container(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.containers.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn list_containers(State(state): State<SharedState>) -> impl IntoResponse {
    let containers = state.containers.lock().unwrap();
    let running: Vec<serde_json::Value> = containers
        .iter()
        .filter(|(_, running)| **running)
        .map(|(id, _)| serde_json::json!({"Id": id}))
        .collect();
    Json(running)
}

/// Frame `payload` as a single-entry tar archive.
fn make_archive(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = [0u8; BLOCK_SIZE];
    header[..name.len()].copy_from_slice(name.as_bytes());
    let size_field = format!("{:011o}\0", payload.len());
    header[124..136].copy_from_slice(size_field.as_bytes());
    header[156] = b'0';
    header[148..156].copy_from_slice(b"        ");
    let sum: u64 = header.iter().map(|b| u64::from(*b)).sum();
    header[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());

    let mut out = header.to_vec();
    out.extend_from_slice(payload);
    out.extend_from_slice(&vec![0u8; payload.len().next_multiple_of(BLOCK_SIZE) - payload.len()]);
    out.extend_from_slice(&[0u8; BLOCK_SIZE * 2]);
    out
}

/// Start the emulator on an ephemeral port and return a client for it.
async fn spawn_daemon() -> (DockerClient, SharedState) {
    let state: SharedState = Arc::new(DaemonState::default());

    let app = Router::new()
        .route("/v1.43/containers/create", post(create_container))
        .route("/v1.43/containers/{id}/start", post(start_container))
        .route("/v1.43/containers/{id}/wait", post(wait_container))
        .route("/v1.43/containers/{id}/archive", get(copy_archive))
        .route("/v1.43/containers/{id}", delete(remove_container))
        .route("/v1.43/containers/json", get(list_containers))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = DockerConfig {
        endpoint: format!("http://{addr}"),
        api_version: "v1.43".into(),
    };
    (DockerClient::new(&config), state)
}

fn scraper_spec() -> ContainerSpec {
    ContainerSpec {
        image: "ghcr.io/algo7/tripadvisor-review-scraper/scrap:latest".into(),
        env: vec!["CONCURRENCY=1".into(), "HOTEL_NAME=Grand_Palace".into()],
    }
}

#[tokio::test]
async fn full_lifecycle_roundtrip() {
    let (client, state) = spawn_daemon().await;
    state.files.lock().unwrap().insert(
        "0_Grand_Palace.csv".into(),
        b"title,content\nGreat,Loved it\n".to_vec(),
    );

    let id = client.create_container(&scraper_spec()).await.unwrap();
    assert_eq!(client.count_running().await.unwrap(), 0);

    client.start_container(&id).await.unwrap();
    assert_eq!(client.count_running().await.unwrap(), 1);

    let status = client.wait_container(&id).await.unwrap();
    assert_eq!(status.code, 0);

    let stream = client
        .copy_from_container(&id, "/puppeteer/reviews/0_Grand_Palace.csv")
        .await
        .unwrap();
    let data = archive::extract_file(stream, "0_Grand_Palace.csv")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(data, b"title,content\nGreat,Loved it\n");

    client
        .remove_container(&id, RemoveOptions::forced())
        .await
        .unwrap();
    assert_eq!(client.count_running().await.unwrap(), 0);
    assert!(state.containers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_archive_path_maps_to_path_not_found() {
    let (client, _state) = spawn_daemon().await;

    let id = client.create_container(&scraper_spec()).await.unwrap();
    client.start_container(&id).await.unwrap();
    client.wait_container(&id).await.unwrap();

    let err = client
        .copy_from_container(&id, "/puppeteer/reviews/0_absent.csv")
        .await
        .err()
        .unwrap();
    assert_matches!(err, BackendError::PathNotFound(path) => {
        assert_eq!(path, "/puppeteer/reviews/0_absent.csv");
    });
}

#[tokio::test]
async fn create_conflict_maps_to_conflict() {
    let (client, _state) = spawn_daemon().await;

    let spec = ContainerSpec {
        image: "conflict/image:latest".into(),
        env: Vec::new(),
    };
    let err = client.create_container(&spec).await.unwrap_err();
    assert_matches!(err, BackendError::Conflict(_));
}

#[tokio::test]
async fn double_start_maps_to_conflict() {
    let (client, _state) = spawn_daemon().await;

    let id = client.create_container(&scraper_spec()).await.unwrap();
    client.start_container(&id).await.unwrap();

    let err = client.start_container(&id).await.unwrap_err();
    assert_matches!(err, BackendError::Conflict(_));
}

#[tokio::test]
async fn wait_error_body_maps_to_wait() {
    let (client, state) = spawn_daemon().await;

    // Seed a container whose id triggers the emulator's wait failure.
    let id = ContainerId("c-wait-error".into());
    state
        .containers
        .lock()
        .unwrap()
        .insert(id.0.clone(), true);

    let err = client.wait_container(&id).await.unwrap_err();
    assert_matches!(err, BackendError::Wait(message) => {
        assert_eq!(message, "daemon went away");
    });
}

#[tokio::test]
async fn unreachable_daemon_maps_to_unavailable() {
    // Nothing listens on this port.
    let config = DockerConfig {
        endpoint: "http://127.0.0.1:1".into(),
        api_version: "v1.43".into(),
    };
    let client = DockerClient::new(&config);

    let err = client.count_running().await.unwrap_err();
    assert_matches!(err, BackendError::Unavailable(_));
}
