//! Application service: fleet operations proxy.
//!
//! Validates credentials, builds scoped clients through the injected
//! connector and dispatches on the requested action. Every action re-reads
//! the control plane; nothing is cached between calls.

pub mod deploy;
pub mod entities;
pub mod inventory;
pub mod prune;
pub mod wipe;

use ptero_common::{
    ConfirmPayload, ConnectionStatus, CreateServerPayload, CreateUserPayload, DeleteAck,
    DeletePayload, DeployReport, Envelope, FleetRequest, FullInventory, Inventory, ManagedServer,
    NumericValue, PruneReport, WipeReport,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::ports::{ControlPlaneConnector, ScopedClients};
use crate::domain::{Credentials, FleetAction, FleetPolicy, OpsError, OpsResult};

/// Successful result of any fleet action, serialized as the bare payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FleetOutcome {
    Connection(ConnectionStatus),
    Inventory(Inventory),
    FullInventory(FullInventory),
    Deployed(DeployReport),
    ServerCreated(Envelope<ManagedServer>),
    Deleted(DeleteAck),
    Pruned(PruneReport),
    Wiped(WipeReport),
}

impl FleetOutcome {
    /// One-line description for terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Connection(c) => c.msg.clone(),
            Self::Inventory(i) => format!("{} users, {} servers", i.users.len(), i.servers.len()),
            Self::FullInventory(i) => format!(
                "{} users, {} servers with runtime state",
                i.users.len(),
                i.servers.len()
            ),
            Self::Deployed(d) => format!(
                "created user {} (id {}) with server {} (id {})",
                d.user.attributes.username,
                d.user.attributes.id,
                d.server.attributes.name,
                d.server.attributes.id
            ),
            Self::ServerCreated(s) => {
                format!("created server {} (id {})", s.attributes.name, s.attributes.id)
            }
            Self::Deleted(_) => "deleted".to_string(),
            Self::Pruned(p) => p.msg.clone(),
            Self::Wiped(w) => format!(
                "{} ({} servers, {} users deleted, {} admins kept)",
                w.msg, w.servers.succeeded, w.users.succeeded, w.skipped_admins
            ),
        }
    }
}

/// Validate the request and run its action.
///
/// Credentials are checked before the action name, and both before any
/// client is built.
///
/// # Errors
///
/// - [`OpsError::Auth`] for missing or malformed credentials.
/// - [`OpsError::UnknownAction`] for an action outside the closed set.
/// - Whatever the action itself returns.
pub async fn execute<C: ControlPlaneConnector + ?Sized>(
    connector: &C,
    request: &FleetRequest,
    policy: &FleetPolicy,
) -> OpsResult<FleetOutcome> {
    let credentials = Credentials::from_parts(
        request.host.as_deref(),
        request.ptla.as_deref(),
        request.ptlc.as_deref(),
    )?;
    let action: FleetAction = request.action.as_deref().unwrap_or_default().parse()?;
    let clients = connector.connect(&credentials)?;

    tracing::info!(%action, host = %credentials.host(), "fleet action");
    dispatch(action, &credentials, &clients, &request.payload, policy)
        .await
        .inspect_err(|e| {
            tracing::warn!(%action, kind = e.kind(), error = %e, "fleet action failed");
        })
}

/// Run one already-parsed action against prepared clients.
///
/// # Errors
///
/// Returns [`OpsError::Validation`] for a malformed payload, and whatever the
/// selected action returns.
pub async fn dispatch(
    action: FleetAction,
    credentials: &Credentials,
    clients: &ScopedClients,
    payload: &Value,
    policy: &FleetPolicy,
) -> OpsResult<FleetOutcome> {
    let admin = clients.admin.as_ref();
    let owner = clients.owner.as_deref();

    let outcome = match action {
        FleetAction::CheckConnection => FleetOutcome::Connection(
            inventory::check_connection(admin, credentials.host()).await?,
        ),
        FleetAction::GetStats => {
            FleetOutcome::Inventory(inventory::stats(admin, policy.stats_page_size).await?)
        }
        FleetAction::GetStatsFull => FleetOutcome::FullInventory(
            inventory::stats_full(admin, owner, policy.stats_page_size).await?,
        ),
        FleetAction::CreateUser | FleetAction::AutoDeploy => {
            let body: CreateUserPayload = parse_payload(payload)?;
            FleetOutcome::Deployed(deploy::create_user_with_server(admin, &body, policy).await?)
        }
        FleetAction::CreateServer => {
            let body: CreateServerPayload = parse_payload(payload)?;
            FleetOutcome::ServerCreated(deploy::create_server(admin, &body, policy).await?)
        }
        FleetAction::DeleteUser => {
            let body: DeletePayload = parse_payload(payload)?;
            FleetOutcome::Deleted(entities::delete_user(admin, &body).await?)
        }
        FleetAction::DeleteServer => {
            let body: DeletePayload = parse_payload(payload)?;
            FleetOutcome::Deleted(entities::delete_server(admin, &body).await?)
        }
        FleetAction::DeleteOffline => {
            FleetOutcome::Pruned(prune::delete_offline(admin, owner, policy).await?)
        }
        FleetAction::NukeAll => {
            let body: ConfirmPayload = parse_payload(payload)?;
            FleetOutcome::Wiped(wipe::nuke_all(admin, &body, policy).await?)
        }
    };
    Ok(outcome)
}

/// Decode an action payload. A missing (`null`) payload decodes as empty.
///
/// # Errors
///
/// Returns [`OpsError::Validation`] if the payload has the wrong shape.
pub fn parse_payload<T: DeserializeOwned + Default>(payload: &Value) -> OpsResult<T> {
    if payload.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(payload.clone())
        .map_err(|e| OpsError::Validation(format!("invalid payload: {e}")))
}

/// Resolve a numeric id field, accepting numbers and numeric strings.
pub(crate) fn required_id(value: Option<&NumericValue>, field: &str) -> OpsResult<u64> {
    value
        .and_then(NumericValue::as_u64)
        .ok_or_else(|| OpsError::Validation(format!("payload.{field} must be a numeric id")))
}
