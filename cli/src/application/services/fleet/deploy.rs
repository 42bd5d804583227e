//! Creation actions: user plus first server, and standalone server.
//!
//! The two calls of `create_user_with_server` are not transactional. When
//! the server step fails the user already exists; the error names it and,
//! if the policy asks for it, a compensating delete is attempted.

use ptero_common::{CreateServerPayload, CreateUserPayload, DeployReport, Envelope, ManagedServer};
use uuid::Uuid;

use super::required_id;
use crate::application::ports::AdminApi;
use crate::domain::fleet::{IdentitySeed, UserDraft, orphan_detail};
use crate::domain::{FleetPolicy, NewServer, OpsError, OpsResult};

/// Create a user, then one server owned by it from the service template.
///
/// # Errors
///
/// - The upstream error if user creation fails (nothing was created).
/// - [`OpsError::Upstream`] with an orphan detail if server creation fails.
pub async fn create_user_with_server(
    admin: &dyn AdminApi,
    payload: &CreateUserPayload,
    policy: &FleetPolicy,
) -> OpsResult<DeployReport> {
    let suffix = Uuid::new_v4().simple().to_string();
    let password = Uuid::new_v4().simple().to_string();
    let draft = UserDraft::resolve(
        payload,
        IdentitySeed {
            suffix: &suffix,
            password: &password,
            email_domain: &policy.user_email_domain,
        },
    );

    let user = admin.create_user(&draft.user).await?;
    let user_id = user.attributes.id;
    tracing::info!(user_id, username = %user.attributes.username, "user created");

    let server = NewServer {
        name: draft.server_name,
        owner_user_id: user_id,
        template: policy.template.clone(),
    };
    match admin.create_server(&server).await {
        Ok(server) => {
            tracing::info!(user_id, server_id = server.attributes.id, "server created");
            Ok(DeployReport { user, server })
        }
        Err(cause) => {
            let rolled_back = policy.rollback_orphaned_users && rollback(admin, user_id).await;
            tracing::warn!(
                user_id,
                rolled_back,
                error = %cause,
                "server creation failed after user creation"
            );
            let status = match &cause {
                OpsError::Upstream { status, .. } => *status,
                _ => None,
            };
            Err(OpsError::Upstream {
                message: cause.to_string(),
                status,
                detail: Some(orphan_detail(user_id, rolled_back, &cause)),
            })
        }
    }
}

async fn rollback(admin: &dyn AdminApi, user_id: u64) -> bool {
    match admin.delete_user(user_id).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "compensating user delete failed");
            false
        }
    }
}

/// Create one server for an existing user from the service template.
///
/// # Errors
///
/// Returns [`OpsError::Validation`] without a name or owner id, otherwise the
/// upstream error.
pub async fn create_server(
    admin: &dyn AdminApi,
    payload: &CreateServerPayload,
    policy: &FleetPolicy,
) -> OpsResult<Envelope<ManagedServer>> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| OpsError::Validation("payload.name is required".into()))?;
    let owner_user_id = required_id(payload.user_id.as_ref(), "userId")?;

    let server = admin
        .create_server(&NewServer {
            name: name.to_string(),
            owner_user_id,
            template: policy.template.clone(),
        })
        .await?;
    tracing::info!(user_id = owner_user_id, server_id = server.attributes.id, "server created");
    Ok(server)
}
