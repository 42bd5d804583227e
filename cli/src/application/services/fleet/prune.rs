//! Conditional batch delete of servers that are not running.

use ptero_common::{BatchResult, PruneReport};

use crate::application::ports::{AdminApi, OwnerApi};
use crate::domain::fleet::PruneDecision;
use crate::domain::{FleetPolicy, OpsError, OpsResult};

pub const OWNER_TOKEN_REQUIRED: &str = "PTLC Key Required for this action";

/// Scan the first `prune_scan_limit` servers and delete the offline ones.
///
/// Status lookups and deletes run one server at a time. A failed delete is
/// recorded in the batch and the scan continues.
///
/// # Errors
///
/// - [`OpsError::Validation`] without an owner client; no call is made.
/// - The upstream error if the server listing fails.
pub async fn delete_offline(
    admin: &dyn AdminApi,
    owner: Option<&dyn OwnerApi>,
    policy: &FleetPolicy,
) -> OpsResult<PruneReport> {
    let owner = owner.ok_or_else(|| OpsError::Validation(OWNER_TOKEN_REQUIRED.into()))?;

    let servers = admin.list_servers(policy.prune_fetch_page_size).await?;
    let mut batch = BatchResult::default();
    let mut scanned = 0;
    let mut unreachable_kept = 0;

    for server in servers.iter().take(policy.prune_scan_limit) {
        scanned += 1;
        let id = server.attributes.id;
        let state = match owner.server_state(&server.attributes.uuid).await {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(server_id = id, error = %e, "status lookup failed");
                None
            }
        };

        match policy.prune_decision(state) {
            PruneDecision::Delete => match admin.delete_server(id).await {
                Ok(()) => {
                    tracing::info!(server_id = id, outcome = "deleted", "prune");
                    batch.record_success();
                }
                Err(e) => {
                    tracing::warn!(server_id = id, outcome = "failed", error = %e, "prune");
                    batch.record_failure(id, e.to_string());
                }
            },
            PruneDecision::Keep => {}
            PruneDecision::KeepUnreachable => unreachable_kept += 1,
        }
    }

    Ok(PruneReport {
        msg: format!(
            "Scanned {scanned} servers, deleted {} offline.",
            batch.succeeded
        ),
        deleted_count: batch.succeeded,
        scanned,
        unreachable_kept,
        batch,
    })
}
