#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use reqwest::Client;
use tokio::sync::Notify;
use uuid::Uuid;

use formrelay::config::{default_tracking_keys, Config, RelayConfig};
use formrelay::db::{MemorySubmissionStore, StoreError, SubmissionStore};
use formrelay::models::{
    ApplicantFields, NewSubmission, SubmissionRecord, SubmissionStatus, TrackingParams,
};
use formrelay::relay::{RelayClient, RelayError, RelayMode, RelayOutcome};
use formrelay::state::SharedState;

/// A fresh scratch directory under the system temp dir.
pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}_{}", Uuid::now_v7().simple()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

pub fn test_config(target_url: &str, upload_dir: PathBuf) -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 10 * 1024 * 1024,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        upload_dir,
        static_dir: PathBuf::from("static"),
        relay: RelayConfig {
            target_url: target_url.to_string(),
            thank_you_url: "https://partner.example/success".to_string(),
            mode: RelayMode::Immediate,
            timeout_secs: 5,
            disclosure_sections: 1,
        },
        tracking_keys: default_tracking_keys(),
        rate_limit: 100,
        rate_limit_window_secs: 60,
    }
}

pub fn fields(first_name: &str, last_name: &str, email: &str) -> ApplicantFields {
    ApplicantFields {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        ..Default::default()
    }
}

pub async fn pending_record(
    store: &dyn SubmissionStore,
    fields: ApplicantFields,
    resume_ref: Option<String>,
) -> SubmissionRecord {
    store
        .create(NewSubmission { fields, resume_ref })
        .await
        .expect("create failed")
}

// ── Stub partner endpoint ───────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub content_type: String,
    pub body: String,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

/// An HTTP server standing in for the partner's form handler.
pub struct StubTarget {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl StubTarget {
    pub fn url(&self) -> String {
        format!("http://{}/apply", self.addr)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

async fn stub_handler(
    State(state): State<StubState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    state.received.lock().unwrap().push(ReceivedRequest {
        content_type,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    if state.status == StatusCode::FOUND {
        return (state.status, [("location", "/success")]).into_response();
    }
    state.status.into_response()
}

pub async fn spawn_stub_target(status: u16) -> StubTarget {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        status: StatusCode::from_u16(status).unwrap(),
        received: received.clone(),
    };
    let app = Router::new()
        .route("/apply", post(stub_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub target");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub target failed");
    });

    StubTarget { addr, received }
}

/// A URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/apply")
}

// ── Relay client doubles ────────────────────────────────────────

pub enum StubBehavior {
    Outcome(RelayOutcome),
    MissingFile,
}

/// Returns a canned result and records every call.
pub struct StubClient {
    behavior: StubBehavior,
    pub calls: Mutex<Vec<(Uuid, TrackingParams)>>,
    gate: Option<Arc<Notify>>,
}

impl StubClient {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn status(status_code: u16) -> Self {
        Self::new(StubBehavior::Outcome(RelayOutcome::from_status(status_code)))
    }

    /// Hold every `send` until the returned notifier fires.
    pub fn gated(behavior: StubBehavior) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut client = Self::new(behavior);
        client.gate = Some(gate.clone());
        (client, gate)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RelayClient for StubClient {
    async fn send(
        &self,
        record: &SubmissionRecord,
        tracking: &TrackingParams,
    ) -> Result<RelayOutcome, RelayError> {
        self.calls
            .lock()
            .unwrap()
            .push((record.id, tracking.clone()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.behavior {
            StubBehavior::Outcome(outcome) => Ok(outcome.clone()),
            StubBehavior::MissingFile => Err(RelayError::NotFound("resume.pdf".to_string())),
        }
    }
}

// ── Store doubles ───────────────────────────────────────────────

/// Memory store whose first `failures` status writes fail.
pub struct FlakyStore {
    pub inner: MemorySubmissionStore,
    failures: Mutex<usize>,
    pub update_attempts: Mutex<Vec<SubmissionStatus>>,
}

impl FlakyStore {
    pub fn failing(failures: usize) -> Self {
        Self {
            inner: MemorySubmissionStore::new(),
            failures: Mutex::new(failures),
            update_attempts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SubmissionStore for FlakyStore {
    async fn create(&self, new: NewSubmission) -> Result<SubmissionRecord, StoreError> {
        self.inner.create(new).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>, StoreError> {
        self.inner.list(limit, offset).await
    }

    async fn mark_processing(&self, id: Uuid) -> Result<Option<SubmissionRecord>, StoreError> {
        self.inner.mark_processing(id).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        external_reference: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.update_attempts.lock().unwrap().push(status);
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
        }
        self.inner.update_status(id, status, external_reference).await
    }

    async fn count_by_status(&self) -> Result<Vec<(SubmissionStatus, i64)>, StoreError> {
        self.inner.count_by_status().await
    }
}

// ── Full application ────────────────────────────────────────────

/// A running app instance backed by an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: SharedState,
    pub client: Client,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Poll until the submission leaves `pending`/`processing`.
    pub async fn wait_for_terminal(&self, id: Uuid) -> SubmissionRecord {
        for _ in 0..200 {
            if let Some(record) = self.state.store.get(id).await.unwrap() {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
        panic!("submission {id} never reached a terminal status");
    }
}

pub async fn spawn_app(target_url: &str) -> TestApp {
    spawn_app_with(Arc::new(MemorySubmissionStore::new()), None, target_url).await
}

pub async fn spawn_app_with(
    store: Arc<dyn SubmissionStore>,
    client: Option<Arc<dyn RelayClient>>,
    target_url: &str,
) -> TestApp {
    let upload_dir = temp_dir("formrelay_uploads");
    let config = test_config(target_url, upload_dir.clone());
    spawn_app_with_config(store, client, config).await
}

pub async fn spawn_app_with_config(
    store: Arc<dyn SubmissionStore>,
    client: Option<Arc<dyn RelayClient>>,
    config: Config,
) -> TestApp {
    let upload_dir = config.upload_dir.clone();

    let (app, state) = match client {
        Some(client) => formrelay::build_app_with_client(store, client, config),
        None => formrelay::build_app(store, config),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        state,
        client,
        upload_dir,
    }
}

pub fn cleanup(app: TestApp) {
    let _ = std::fs::remove_dir_all(&app.upload_dir);
}
