#![allow(dead_code)]

use axum::{
    extract::{Multipart, State},
    http::{header::CONTENT_TYPE, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stegano_gateway::{config::Config, context::AppContext, db::DbPool};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const USER: (&str, &str) = ("user", "user123");

/// Base URL that never accepts connections
const UNREACHABLE_ANALYSIS_URL: &str = "http://127.0.0.1:1";

// ============================================================================
// Stub analysis service
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub filename: Option<String>,
    pub file_len: usize,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StubBehavior {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self {
            status: 200,
            body: json!({"status": "ok"}).to_string(),
            delay: None,
        }
    }
}

#[derive(Clone, Default)]
struct StubState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    behavior: Arc<Mutex<StubBehavior>>,
}

impl StubState {
    async fn respond(&self) -> Response {
        let behavior = self.behavior.lock().unwrap().clone();
        if let Some(delay) = behavior.delay {
            tokio::time::sleep(delay).await;
        }
        let status = StatusCode::from_u16(behavior.status).unwrap();
        (status, [(CONTENT_TYPE, "application/json")], behavior.body).into_response()
    }
}

async fn stub_file_endpoint(
    State(state): State<StubState>,
    uri: Uri,
    mut multipart: Multipart,
) -> Response {
    let mut call = RecordedCall {
        path: uri.path().to_string(),
        filename: None,
        file_len: 0,
        signature: None,
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                call.filename = field.file_name().map(str::to_string);
                call.file_len = field.bytes().await.unwrap().len();
            }
            "signature" => call.signature = Some(field.text().await.unwrap()),
            _ => {}
        }
    }

    state.calls.lock().unwrap().push(call);
    state.respond().await
}

async fn stub_test_endpoint(State(state): State<StubState>, uri: Uri) -> Response {
    state.calls.lock().unwrap().push(RecordedCall {
        path: uri.path().to_string(),
        filename: None,
        file_len: 0,
        signature: None,
    });
    state.respond().await
}

pub struct StubAnalysis {
    pub base_url: String,
    state: StubState,
}

impl StubAnalysis {
    pub async fn spawn() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/v2/upload", post(stub_file_endpoint))
            .route("/api/v2/add_steganography", post(stub_file_endpoint))
            .route("/api/v2/verify_integrity", post(stub_file_endpoint))
            .route("/api/v2/test", get(stub_test_endpoint))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, state }
    }

    /// Reply with `status` and the JSON `body` to every call
    pub fn respond_with(&self, status: u16, body: Value) {
        let mut behavior = self.state.behavior.lock().unwrap();
        behavior.status = status;
        behavior.body = body.to_string();
    }

    pub fn respond_with_raw(&self, status: u16, body: &str) {
        let mut behavior = self.state.behavior.lock().unwrap();
        behavior.status = status;
        behavior.body = body.to_string();
    }

    pub fn delay_responses(&self, delay: Duration) {
        self.state.behavior.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

// ============================================================================
// Gateway under test
// ============================================================================

pub struct TestApp {
    pub address: String,
    pub db_pool: DbPool,
    pub upload_dir: PathBuf,
    pub analysis: Option<StubAnalysis>,
    pub http: reqwest::Client,
    _scratch: TempDir,
}

/// Gateway wired to a fresh stub analysis service
pub async fn spawn_app() -> TestApp {
    let stub = StubAnalysis::spawn().await;
    let base_url = stub.base_url.clone();
    spawn_app_with(base_url, Some(stub)).await
}

/// Gateway whose analysis service cannot be reached
pub async fn spawn_app_without_analysis() -> TestApp {
    spawn_app_with(UNREACHABLE_ANALYSIS_URL.to_string(), None).await
}

async fn spawn_app_with(analysis_url: String, analysis: Option<StubAnalysis>) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let upload_dir = scratch.path().join("uploads");
    std::fs::create_dir_all(&upload_dir).unwrap();

    let mut config = Config::with_secret(TEST_SECRET);
    config.database_url = format!("sqlite://{}", scratch.path().join("gateway.db").display());
    config.security.bcrypt_cost = 4;
    config.analysis.base_url = analysis_url;
    config.analysis.timeout_secs = Some(1);
    config.analysis.upload_dir = upload_dir.clone();

    let app_context = AppContext::initialize(config)
        .await
        .expect("Failed to initialize app context");
    let db_pool = app_context.db_pool.as_ref().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(stegano_gateway::serve(
        app_context,
        listener,
        std::future::pending(),
    ));

    TestApp {
        address,
        db_pool,
        upload_dir,
        analysis,
        http: reqwest::Client::new(),
        _scratch: scratch,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn stub(&self) -> &StubAnalysis {
        self.analysis.as_ref().expect("App was spawned without a stub")
    }

    pub async fn login(&self, (username, password): (&str, &str)) -> String {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200, "login failed for {}", username);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Value {
        let response = self
            .http
            .post(self.url("/api/users"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// POST a multipart form with a `file` part (and optional `signature`)
    pub async fn post_file(
        &self,
        path: &str,
        token: Option<&str>,
        filename: &str,
        data: &[u8],
        signature: Option<&str>,
    ) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("image/png")
            .unwrap();
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(signature) = signature {
            form = form.text("signature", signature.to_string());
        }

        let mut request = self.http.post(self.url(path)).multipart(form);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn upload(&self, token: &str, filename: &str) -> Value {
        let response = self
            .post_file("/api/images/upload", Some(token), filename, b"\x89PNG-data", None)
            .await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.http.delete(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }

    pub async fn image_count(&self) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM images")
            .fetch_one(&self.db_pool)
            .await
            .unwrap();
        count
    }

    /// True when no staged upload was left behind
    pub fn scratch_is_empty(&self) -> bool {
        std::fs::read_dir(&self.upload_dir).unwrap().count() == 0
    }
}
