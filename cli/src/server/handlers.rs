//! Route handlers for the HTTP gateway.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use ptero_common::{FleetRequest, ProvisionRequest, ProvisionResponse};
use serde_json::Value;

use super::AppState;
use super::error::ApiError;
use crate::application::services::fleet::{self, FleetOutcome};
use crate::application::services::provision::provision;
use crate::domain::{OpsError, RemoteTarget};
use crate::infra::progress::TracingReporter;

pub const INVALID_ACCESS_KEY: &str = "Invalid Access Key!";

/// `POST /api/panel`
pub async fn panel(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FleetRequest>, JsonRejection>,
) -> Result<Json<FleetOutcome>, ApiError> {
    let Json(request) = body?;
    let outcome = fleet::execute(state.connector.as_ref(), &request, &state.policy).await?;
    Ok(Json(outcome))
}

/// `POST /api/install`
///
/// The shared secret is checked on the raw body, before the rest of the
/// request is parsed, so a caller without it gets 401 whatever the other
/// fields hold.
pub async fn install(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProvisionResponse>, ApiError> {
    let Json(body) = body?;
    if !state.install_key.matches(body.get("key").and_then(Value::as_str)) {
        tracing::warn!(
            ip = body.get("ip").and_then(serde_json::Value::as_str).unwrap_or(""),
            "install rejected: bad key"
        );
        return Err(OpsError::Auth(INVALID_ACCESS_KEY.into()).into());
    }

    let request: ProvisionRequest =
        serde_json::from_value(body).map_err(|e| ApiError::BadJson(e.to_string()))?;
    let target = RemoteTarget::from_request(&request)?;
    let receipt = provision(
        state.shell.as_ref(),
        &state.plan,
        &state.profile,
        &target,
        &TracingReporter,
    )
    .await?;

    Ok(Json(ProvisionResponse {
        success: receipt.accepted,
        message: receipt.message,
    }))
}

/// Minimal health-check handler for load-balancer probes.
pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
