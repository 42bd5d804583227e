//! Single-entity deletes.

use ptero_common::{DeleteAck, DeletePayload};

use super::required_id;
use crate::application::ports::AdminApi;
use crate::domain::OpsResult;

/// # Errors
///
/// Returns a validation error without a numeric `id`, otherwise the upstream
/// error.
pub async fn delete_user(admin: &dyn AdminApi, payload: &DeletePayload) -> OpsResult<DeleteAck> {
    let id = required_id(payload.id.as_ref(), "id")?;
    admin.delete_user(id).await?;
    tracing::info!(user_id = id, "user deleted");
    Ok(DeleteAck { success: true })
}

/// # Errors
///
/// Returns a validation error without a numeric `id`, otherwise the upstream
/// error.
pub async fn delete_server(
    admin: &dyn AdminApi,
    payload: &DeletePayload,
) -> OpsResult<DeleteAck> {
    let id = required_id(payload.id.as_ref(), "id")?;
    admin.delete_server(id).await?;
    tracing::info!(server_id = id, "server deleted");
    Ok(DeleteAck { success: true })
}
