//! Request and response bodies exchanged with the dashboard.
//!
//! Field names follow what the dashboard already sends (`ptla`, `domPnl`,
//! `userId`, ...), so these types are the contract, not a redesign of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{BatchResult, Envelope, ManagedServer, ManagedUser, NumericValue, ServerRecord};

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Body of `POST /api/panel`.
///
/// Everything is optional at the wire level; missing credentials are reported
/// as an auth error rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetRequest {
    #[serde(default)]
    pub host: Option<String>,
    /// Admin-scope (application) API token.
    #[serde(default)]
    pub ptla: Option<String>,
    /// Owner-scope (client) API token.
    #[serde(default)]
    pub ptlc: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

/// Body of `POST /api/install`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub pw: Option<String>,
    #[serde(default, rename = "domPnl")]
    pub dom_pnl: Option<String>,
    #[serde(default, rename = "domNode")]
    pub dom_node: Option<String>,
    #[serde(default)]
    pub ram: Option<NumericValue>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
}

/// Payload of `create_user` / `auto_deploy`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserPayload {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, alias = "serverName")]
    pub server_name: Option<String>,
}

/// Payload of `create_server`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateServerPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<NumericValue>,
}

/// Payload of `delete_user` / `delete_server`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletePayload {
    #[serde(default)]
    pub id: Option<NumericValue>,
}

/// Payload of `nuke_all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmPayload {
    #[serde(default)]
    pub confirm: Option<String>,
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Uniform error body for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// Successful `POST /api/install` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub status: String,
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub users: Vec<Envelope<ManagedUser>>,
    pub servers: Vec<Envelope<ManagedServer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FullInventory {
    pub users: Vec<Envelope<ManagedUser>>,
    pub servers: Vec<ServerRecord>,
}

/// Result of the combined user + server creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployReport {
    pub user: Envelope<ManagedUser>,
    pub server: Envelope<ManagedServer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteAck {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    pub msg: String,
    pub deleted_count: usize,
    pub scanned: usize,
    /// Servers whose status lookup failed and were left alone.
    pub unreachable_kept: usize,
    pub batch: BatchResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WipeReport {
    pub msg: String,
    pub servers: BatchResult,
    pub users: BatchResult,
    pub skipped_admins: usize,
}
