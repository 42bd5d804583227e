use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Control-plane resource wrapper: `{"object": "user", "attributes": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(default)]
    pub object: String,
    pub attributes: T,
}

impl<T> Envelope<T> {
    pub fn new(object: &str, attributes: T) -> Self {
        Self {
            object: object.to_string(),
            attributes,
        }
    }
}

/// Paginated list returned by `/api/application/*` listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default)]
    pub object: String,
    pub data: Vec<Envelope<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// A user account owned by the control plane.
///
/// Attributes the orchestrator does not interpret are kept in `extra` so the
/// dashboard sees the full record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagedUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub root_admin: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A game/service server owned by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagedServer {
    pub id: u64,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    /// Owning user id (`user` on the wire).
    #[serde(rename = "user", default)]
    pub owner_user_id: u64,
    /// Hosting node id (`node` on the wire).
    #[serde(rename = "node", default)]
    pub node_id: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Runtime power state reported by `/api/client/servers/{uuid}/resources`.
///
/// `Unknown` is used when no owner-scope token is available, `Error` when the
/// status lookup itself failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Offline,
    Starting,
    Running,
    Stopping,
    Unknown,
    Error,
}

impl RuntimeState {
    /// Map a `current_state` string to a state; unrecognised values are `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "offline" => Self::Offline,
            "starting" => Self::Starting,
            "running" => Self::Running,
            "stopping" => Self::Stopping,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Unknown => "unknown",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server record annotated with its runtime state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRecord {
    #[serde(flatten)]
    pub server: Envelope<ManagedServer>,
    pub runtime_state: RuntimeState,
}

/// One failed entity inside a batch operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    pub entity_id: u64,
    pub cause: String,
}

/// Aggregated outcome of a multi-entity operation.
///
/// Every attempted entity lands in exactly one of `succeeded` or `errors`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, entity_id: u64, cause: impl Into<String>) {
        self.attempted += 1;
        self.errors.push(BatchError {
            entity_id,
            cause: cause.into(),
        });
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.errors.len()
    }
}

/// A number that the dashboard may send either as JSON number or as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NumericValue {
    Number(u64),
    Text(String),
}

impl NumericValue {
    /// Parse to `u64`; `None` for non-numeric text.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}
