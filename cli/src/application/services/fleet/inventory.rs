//! Read-only fleet actions: connectivity check and inventory.

use futures_util::future::join_all;
use ptero_common::{ConnectionStatus, FullInventory, Inventory, RuntimeState, ServerRecord};

use crate::application::ports::{AdminApi, OwnerApi};
use crate::domain::OpsResult;

/// One single-entry user listing; no writes.
///
/// # Errors
///
/// Returns the upstream error if the listing fails.
pub async fn check_connection(admin: &dyn AdminApi, host: &str) -> OpsResult<ConnectionStatus> {
    admin.list_users(1).await?;
    Ok(ConnectionStatus {
        status: "connected".to_string(),
        msg: format!("Connected to {host}"),
    })
}

/// Users and servers, fetched concurrently.
///
/// # Errors
///
/// Returns the first upstream error from either listing.
pub async fn stats(admin: &dyn AdminApi, page_size: u32) -> OpsResult<Inventory> {
    let (users, servers) =
        tokio::try_join!(admin.list_users(page_size), admin.list_servers(page_size))?;
    Ok(Inventory { users, servers })
}

/// Users and servers plus each server's runtime state.
///
/// Without an owner client every state is `unknown`. A failed lookup marks
/// only that server as `error`; the call itself still succeeds. Records keep
/// the control plane's ordering.
///
/// # Errors
///
/// Returns the first upstream error from the two listings.
pub async fn stats_full(
    admin: &dyn AdminApi,
    owner: Option<&dyn OwnerApi>,
    page_size: u32,
) -> OpsResult<FullInventory> {
    let Inventory { users, servers } = stats(admin, page_size).await?;

    let records = join_all(servers.into_iter().map(|server| async move {
        let runtime_state = match owner {
            None => RuntimeState::Unknown,
            Some(owner) => match owner.server_state(&server.attributes.uuid).await {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        server_id = server.attributes.id,
                        error = %e,
                        "runtime state lookup failed"
                    );
                    RuntimeState::Error
                }
            },
        };
        ServerRecord {
            server,
            runtime_state,
        }
    }))
    .await;

    Ok(FullInventory {
        users,
        servers: records,
    })
}
