//! Fleet action vocabulary, creation requests and prune/wipe policy.
//!
//! Pure functions only. Identity generation takes its randomness as an
//! argument so callers decide where entropy comes from.

use std::fmt;
use std::str::FromStr;

use ptero_common::{CreateUserPayload, RuntimeState};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::error::OpsError;

// ── Actions ──────────────────────────────────────────────────────────────────

/// Closed set of operations accepted by the fleet proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FleetAction {
    CheckConnection,
    GetStats,
    GetStatsFull,
    CreateUser,
    AutoDeploy,
    CreateServer,
    DeleteUser,
    DeleteServer,
    DeleteOffline,
    NukeAll,
}

impl FleetAction {
    pub const ALL: [Self; 10] = [
        Self::CheckConnection,
        Self::GetStats,
        Self::GetStatsFull,
        Self::CreateUser,
        Self::AutoDeploy,
        Self::CreateServer,
        Self::DeleteUser,
        Self::DeleteServer,
        Self::DeleteOffline,
        Self::NukeAll,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckConnection => "check_connection",
            Self::GetStats => "get_stats",
            Self::GetStatsFull => "get_stats_full",
            Self::CreateUser => "create_user",
            Self::AutoDeploy => "auto_deploy",
            Self::CreateServer => "create_server",
            Self::DeleteUser => "delete_user",
            Self::DeleteServer => "delete_server",
            Self::DeleteOffline => "delete_offline",
            Self::NukeAll => "nuke_all",
        }
    }

    /// Actions that delete control-plane entities.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            Self::DeleteUser | Self::DeleteServer | Self::DeleteOffline | Self::NukeAll
        )
    }
}

impl FromStr for FleetAction {
    type Err = OpsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == raw)
            .ok_or_else(|| OpsError::UnknownAction(raw.to_string()))
    }
}

impl fmt::Display for FleetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Creation requests ────────────────────────────────────────────────────────

/// Body of a user creation call.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fixed service template applied to every server the proxy creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTemplate {
    pub egg: u64,
    pub docker_image: String,
    pub startup: String,
    pub allocation: u64,
    pub memory_mb: u64,
    pub disk_mb: u64,
    /// CPU limit in percent of one core.
    pub cpu_percent: u64,
}

/// A server creation request: a name, an owner and the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewServer {
    pub name: String,
    pub owner_user_id: u64,
    pub template: ServerTemplate,
}

impl NewServer {
    /// Request body in the control plane's application-API shape.
    #[must_use]
    pub fn to_request_body(&self) -> Value {
        let t = &self.template;
        json!({
            "name": self.name,
            "user": self.owner_user_id,
            "egg": t.egg,
            "docker_image": t.docker_image,
            "startup": t.startup,
            "environment": {
                "BUILD_NUMBER": "latest",
                "SERVER_JARFILE": "server.jar",
            },
            "limits": {
                "memory": t.memory_mb,
                "swap": 0,
                "disk": t.disk_mb,
                "io": 500,
                "cpu": t.cpu_percent,
            },
            "feature_limits": {
                "databases": 0,
                "backups": 0,
            },
            "allocation": { "default": t.allocation },
        })
    }
}

/// Inputs needed to fill in a user draft that the caller left blank.
#[derive(Debug, Clone, Copy)]
pub struct IdentitySeed<'a> {
    /// At least 8 lowercase hex characters.
    pub suffix: &'a str,
    /// At least 16 characters.
    pub password: &'a str,
    pub email_domain: &'a str,
}

/// Generated or caller-supplied user, plus the name of its first server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub user: NewUser,
    pub server_name: String,
}

impl UserDraft {
    /// Resolve the `create_user` payload, generating anything missing.
    #[must_use]
    pub fn resolve(payload: &CreateUserPayload, seed: IdentitySeed<'_>) -> Self {
        let given = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let username = given(payload.username.as_deref()).unwrap_or_else(|| {
            format!("user-{}", seed.suffix.chars().take(8).collect::<String>())
        });
        let email = given(payload.email.as_deref())
            .unwrap_or_else(|| format!("{username}@{}", seed.email_domain));
        let password = given(payload.password.as_deref())
            .unwrap_or_else(|| seed.password.chars().take(16).collect());
        let first_name = given(payload.first_name.as_deref()).unwrap_or_else(|| username.clone());
        let last_name =
            given(payload.last_name.as_deref()).unwrap_or_else(|| "Member".to_string());
        let server_name = given(payload.server_name.as_deref())
            .unwrap_or_else(|| format!("{username}-server"));

        Self {
            user: NewUser {
                username,
                email,
                first_name,
                last_name,
                password,
            },
            server_name,
        }
    }
}

/// Error detail reported when a user was created but its server was not.
#[must_use]
pub fn orphan_detail(user_id: u64, rolled_back: bool, cause: &OpsError) -> Value {
    let mut detail = json!({
        "stage": "create_server",
        "orphanedUserId": user_id,
        "rolledBack": rolled_back,
        "cause": cause.to_string(),
    });
    if let (Some(upstream), Some(obj)) = (cause.detail(), detail.as_object_mut()) {
        obj.insert("upstream".to_string(), upstream.clone());
    }
    detail
}

// ── Policy ───────────────────────────────────────────────────────────────────

/// Limits and switches governing batch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetPolicy {
    pub stats_page_size: u32,
    pub prune_fetch_page_size: u32,
    pub prune_scan_limit: usize,
    pub wipe_page_size: u32,
    pub wipe_confirm_token: String,
    pub treat_unknown_as_offline: bool,
    pub prune_stopping: bool,
    pub rollback_orphaned_users: bool,
    pub user_email_domain: String,
    pub template: ServerTemplate,
}

impl Default for FleetPolicy {
    fn default() -> Self {
        Self {
            stats_page_size: 100,
            prune_fetch_page_size: 100,
            prune_scan_limit: 15,
            wipe_page_size: 50,
            wipe_confirm_token: "CONFIRM".to_string(),
            treat_unknown_as_offline: true,
            prune_stopping: true,
            rollback_orphaned_users: false,
            user_email_domain: "example.com".to_string(),
            template: ServerTemplate {
                egg: 1,
                docker_image: "ghcr.io/pterodactyl/yolks:java_17".to_string(),
                startup: "java -Xms128M -Xmx{{SERVER_MEMORY}}M -jar server.jar".to_string(),
                allocation: 1,
                memory_mb: 1024,
                disk_mb: 1024,
                cpu_percent: 100,
            },
        }
    }
}

/// What prune does with one scanned server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneDecision {
    Delete,
    Keep,
    /// Status lookup failed and the policy says to leave it alone.
    KeepUnreachable,
}

impl FleetPolicy {
    /// Decide from a status lookup result; `None` means the lookup failed.
    #[must_use]
    pub fn prune_decision(&self, state: Option<RuntimeState>) -> PruneDecision {
        match state {
            Some(RuntimeState::Offline) => PruneDecision::Delete,
            Some(RuntimeState::Stopping) if self.prune_stopping => PruneDecision::Delete,
            Some(_) => PruneDecision::Keep,
            None if self.treat_unknown_as_offline => PruneDecision::Delete,
            None => PruneDecision::KeepUnreachable,
        }
    }

    /// Whether `candidate` matches the wipe guard token.
    #[must_use]
    pub fn confirms_wipe(&self, candidate: Option<&str>) -> bool {
        candidate == Some(self.wipe_confirm_token.as_str())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
