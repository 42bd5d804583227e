//! HTTP gateway tests: requests go through the real router with fake ports
//! behind it.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ptero_common::{Envelope, ManagedServer, ManagedUser};
use ptero_ops::application::ports::{
    AdminApi, ControlPlaneConnector, RemoteSession, RemoteShell, ScopedClients,
};
use ptero_ops::application::services::provision::ACCEPTED_MESSAGE;
use ptero_ops::domain::{
    Credentials, FleetPolicy, InstallKey, InstallPlan, InstallProfile, NewServer, NewUser,
    OpsError, OpsResult, RemoteTarget,
};
use ptero_ops::server::{AppState, router};
use serde_json::{Map, Value, json};
use tower::ServiceExt;

const INSTALL_KEY: &str = "gateway-secret";

// ── Fakes ─────────────────────────────────────────────────────────────────────

struct StubAdmin;

#[async_trait]
impl AdminApi for StubAdmin {
    async fn list_users(&self, _: u32) -> OpsResult<Vec<Envelope<ManagedUser>>> {
        Ok(vec![Envelope::new(
            "user",
            ManagedUser {
                id: 1,
                username: "admin".into(),
                email: "admin@example.com".into(),
                root_admin: true,
                extra: Map::new(),
            },
        )])
    }
    async fn list_servers(&self, _: u32) -> OpsResult<Vec<Envelope<ManagedServer>>> {
        Ok(Vec::new())
    }
    async fn create_user(&self, user: &NewUser) -> OpsResult<Envelope<ManagedUser>> {
        Ok(Envelope::new(
            "user",
            ManagedUser {
                id: 7,
                username: user.username.clone(),
                email: user.email.clone(),
                root_admin: false,
                extra: Map::new(),
            },
        ))
    }
    async fn create_server(&self, _: &NewServer) -> OpsResult<Envelope<ManagedServer>> {
        Err(OpsError::Upstream {
            message: "Request failed with status code 422".into(),
            status: Some(422),
            detail: Some(json!({"errors": [{"code": "NoViableAllocation"}]})),
        })
    }
    async fn delete_user(&self, _: u64) -> OpsResult<()> {
        Ok(())
    }
    async fn delete_server(&self, _: u64) -> OpsResult<()> {
        Ok(())
    }
}

struct StubConnector;

impl ControlPlaneConnector for StubConnector {
    fn connect(&self, _: &Credentials) -> OpsResult<ScopedClients> {
        Ok(ScopedClients {
            admin: Box::new(StubAdmin),
            owner: None,
        })
    }
}

#[derive(Default)]
struct RecordingShell {
    commands: Arc<Mutex<Vec<String>>>,
    refuse: bool,
}

struct RecordingSession {
    commands: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RemoteShell for RecordingShell {
    async fn open(&self, _: &RemoteTarget) -> OpsResult<Box<dyn RemoteSession>> {
        if self.refuse {
            return Err(OpsError::Connection("authentication failed".into()));
        }
        Ok(Box::new(RecordingSession {
            commands: Arc::clone(&self.commands),
        }))
    }
}

#[async_trait]
impl RemoteSession for RecordingSession {
    async fn dispatch(&mut self, command: &str) -> OpsResult<()> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(())
    }
    async fn close(&mut self) {}
}

fn state(shell: RecordingShell) -> Arc<AppState> {
    Arc::new(AppState {
        connector: Arc::new(StubConnector),
        shell: Arc::new(shell),
        policy: FleetPolicy::default(),
        plan: InstallPlan::embedded().unwrap(),
        profile: InstallProfile {
            admin_user: "admin".into(),
            admin_email: "ops@example.com".into(),
            admin_password: "Adm1nPass".into(),
            timezone: "UTC".into(),
            location: "main".into(),
        },
        install_key: InstallKey::new(INSTALL_KEY),
    })
}

// ── Request helpers ───────────────────────────────────────────────────────────

async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn panel_body(action: &str, payload: Value) -> String {
    json!({
        "host": "https://panel.example.com/",
        "ptla": "ptla_admin",
        "action": action,
        "payload": payload,
    })
    .to_string()
}

fn install_body(key: &str) -> String {
    json!({
        "key": key,
        "ip": "203.0.113.10",
        "pw": "ssh-secret",
        "domPnl": "panel.example.com",
        "domNode": "node.example.com",
        "ram": "4096",
    })
    .to_string()
}

// ── /api/panel ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_panel_get_is_method_not_allowed_json() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/panel")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(state(RecordingShell::default()), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_panel_missing_credentials_is_401() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", r#"{"action": "get_stats"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Missing Credentials (Host/PTLA)"}));
}

#[tokio::test]
async fn test_panel_unknown_action_is_404() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", &panel_body("format_disk", Value::Null)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Action unknown: format_disk");
}

#[tokio::test]
async fn test_panel_malformed_json_is_400() {
    let (status, body) = send(state(RecordingShell::default()), post("/api/panel", "{")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body")
    );
}

#[tokio::test]
async fn test_panel_check_connection_normalizes_host() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", &panel_body("check_connection", Value::Null)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "connected", "msg": "Connected to https://panel.example.com"})
    );
}

#[tokio::test]
async fn test_panel_invalid_confirm_is_400() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", &panel_body("nuke_all", json!({"confirm": "no"}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid Confirm"}));
}

#[tokio::test]
async fn test_panel_orphaned_user_is_500_with_detail() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", &panel_body("create_user", json!({"username": "dave"}))),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Request failed with status code 422");
    assert_eq!(body["detail"]["orphanedUserId"], 7);
    assert_eq!(body["detail"]["rolledBack"], false);
    assert_eq!(
        body["detail"]["upstream"]["errors"][0]["code"],
        "NoViableAllocation"
    );
}

#[tokio::test]
async fn test_panel_get_stats_full_without_owner_token_lists_inventory() {
    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/panel", &panel_body("get_stats_full", Value::Null)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"][0]["attributes"]["root_admin"], true);
    assert_eq!(body["servers"], json!([]));
}

// ── /api/install ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_install_wrong_key_is_401_and_opens_nothing() {
    let shell = RecordingShell::default();
    let commands = Arc::clone(&shell.commands);

    let (status, body) = send(state(shell), post("/api/install", &install_body("guess"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid Access Key!"}));
    assert!(commands.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_install_numeric_key_is_401_not_schema_error() {
    let mut body: Value = serde_json::from_str(&install_body(INSTALL_KEY)).unwrap();
    body["key"] = json!(12345);

    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/install", &body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid Access Key!"}));
}

#[tokio::test]
async fn test_install_wrong_key_with_mistyped_field_is_401() {
    let mut body: Value = serde_json::from_str(&install_body("guess")).unwrap();
    body["port"] = json!("22");

    let (status, body) = send(
        state(RecordingShell::default()),
        post("/api/install", &body.to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid Access Key!"}));
}

#[tokio::test]
async fn test_install_valid_key_with_mistyped_field_is_400() {
    let shell = RecordingShell::default();
    let commands = Arc::clone(&shell.commands);
    let mut body: Value = serde_json::from_str(&install_body(INSTALL_KEY)).unwrap();
    body["port"] = json!("22");

    let (status, body) = send(state(shell), post("/api/install", &body.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert!(commands.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_install_missing_ram_is_400() {
    let body = json!({
        "key": INSTALL_KEY,
        "ip": "203.0.113.10",
        "pw": "ssh-secret",
        "domPnl": "panel.example.com",
        "domNode": "node.example.com",
    })
    .to_string();

    let (status, _) = send(state(RecordingShell::default()), post("/api/install", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_install_dispatches_one_command() {
    let shell = RecordingShell::default();
    let commands = Arc::clone(&shell.commands);

    let (status, body) = send(state(shell), post("/api/install", &install_body(INSTALL_KEY))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": ACCEPTED_MESSAGE}));
    let commands = commands.lock().unwrap();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("panel.example.com"));
    assert!(commands[0].contains("4096"));
}

#[tokio::test]
async fn test_install_unreachable_host_is_400() {
    let shell = RecordingShell {
        refuse: true,
        ..RecordingShell::default()
    };

    let (status, body) = send(state(shell), post("/api/install", &install_body(INSTALL_KEY))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "remote connection failed: authentication failed");
}

// ── /health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_is_ok() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(state(RecordingShell::default()), request).await;

    assert_eq!(status, StatusCode::OK);
}
