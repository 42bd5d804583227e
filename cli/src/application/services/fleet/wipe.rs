//! Guarded wipe of one page of servers and non-admin users.

use ptero_common::{BatchResult, ConfirmPayload, WipeReport};

use crate::application::ports::AdminApi;
use crate::domain::{FleetPolicy, OpsError, OpsResult};

pub const INVALID_CONFIRM: &str = "Invalid Confirm";
pub const WIPE_MESSAGE: &str = "Nuke executed on current page batch.";

/// Delete every listed server, then every listed user that is not a root
/// admin. Servers go first so no user is deleted while still owning one.
///
/// # Errors
///
/// - [`OpsError::Validation`] if the confirm token does not match; nothing is
///   called.
/// - The upstream error if either listing fails.
pub async fn nuke_all(
    admin: &dyn AdminApi,
    payload: &ConfirmPayload,
    policy: &FleetPolicy,
) -> OpsResult<WipeReport> {
    if !policy.confirms_wipe(payload.confirm.as_deref()) {
        return Err(OpsError::Validation(INVALID_CONFIRM.into()));
    }

    let mut servers = BatchResult::default();
    for server in admin.list_servers(policy.wipe_page_size).await? {
        let id = server.attributes.id;
        match admin.delete_server(id).await {
            Ok(()) => {
                tracing::info!(server_id = id, outcome = "deleted", "wipe");
                servers.record_success();
            }
            Err(e) => {
                tracing::warn!(server_id = id, outcome = "failed", error = %e, "wipe");
                servers.record_failure(id, e.to_string());
            }
        }
    }

    let mut users = BatchResult::default();
    let mut skipped_admins = 0;
    for user in admin.list_users(policy.wipe_page_size).await? {
        let id = user.attributes.id;
        if user.attributes.root_admin {
            skipped_admins += 1;
            continue;
        }
        match admin.delete_user(id).await {
            Ok(()) => {
                tracing::info!(user_id = id, outcome = "deleted", "wipe");
                users.record_success();
            }
            Err(e) => {
                tracing::warn!(user_id = id, outcome = "failed", error = %e, "wipe");
                users.record_failure(id, e.to_string());
            }
        }
    }

    Ok(WipeReport {
        msg: WIPE_MESSAGE.to_string(),
        servers,
        users,
        skipped_admins,
    })
}
