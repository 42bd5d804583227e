//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared wire types,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.
//!
//! The async ports are object-safe (`async_trait`) because the HTTP gateway
//! holds them behind `Arc<dyn …>` in shared state.

use async_trait::async_trait;
use ptero_common::{Envelope, ManagedServer, ManagedUser, RuntimeState};

use crate::domain::{Credentials, NewServer, NewUser, OpsResult, RemoteTarget};

// ── Control-plane Ports ───────────────────────────────────────────────────────

/// Admin-scope operations on the control plane.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// First page of users, at most `per_page` entries.
    async fn list_users(&self, per_page: u32) -> OpsResult<Vec<Envelope<ManagedUser>>>;
    /// First page of servers, at most `per_page` entries.
    async fn list_servers(&self, per_page: u32) -> OpsResult<Vec<Envelope<ManagedServer>>>;
    async fn create_user(&self, user: &NewUser) -> OpsResult<Envelope<ManagedUser>>;
    async fn create_server(&self, server: &NewServer) -> OpsResult<Envelope<ManagedServer>>;
    async fn delete_user(&self, id: u64) -> OpsResult<()>;
    async fn delete_server(&self, id: u64) -> OpsResult<()>;
}

/// Owner-scope operations; only runtime status is needed.
#[async_trait]
pub trait OwnerApi: Send + Sync {
    async fn server_state(&self, uuid: &str) -> OpsResult<RuntimeState>;
}

/// The clients built for one request.
pub struct ScopedClients {
    pub admin: Box<dyn AdminApi>,
    /// Present only when the caller supplied an owner-scope token.
    pub owner: Option<Box<dyn OwnerApi>>,
}

/// Builds scoped clients from validated credentials.
///
/// Construction performs no network I/O.
pub trait ControlPlaneConnector: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be configured.
    fn connect(&self, credentials: &Credentials) -> OpsResult<ScopedClients>;
}

// ── Remote Shell Ports ────────────────────────────────────────────────────────

/// Opens authenticated remote sessions.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Connect and authenticate with the target's password.
    async fn open(&self, target: &RemoteTarget) -> OpsResult<Box<dyn RemoteSession>>;
}

/// One authenticated session that accepts a command.
#[async_trait]
pub trait RemoteSession: Send {
    /// Submit `command` for execution without waiting for it to finish.
    async fn dispatch(&mut self, command: &str) -> OpsResult<()>;
    /// Tear the session down. Errors are logged by the implementation.
    async fn close(&mut self);
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter: Send + Sync {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
