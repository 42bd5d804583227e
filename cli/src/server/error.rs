use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ptero_common::ErrorBody;

use crate::domain::OpsError;

/// Error type for HTTP handlers.
///
/// Wraps [`OpsError`] and adds the transport-only failures. Every variant
/// renders as `{error, detail?}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Ops(#[from] OpsError),

    /// Body was not JSON or did not match the request shape.
    #[error("Invalid request body: {0}")]
    BadJson(String),

    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadJson(rejection.body_text())
    }
}

/// HTTP status for each domain failure.
#[must_use]
pub fn status_for(err: &OpsError) -> StatusCode {
    match err {
        OpsError::Auth(_) => StatusCode::UNAUTHORIZED,
        OpsError::Validation(_) | OpsError::Connection(_) => StatusCode::BAD_REQUEST,
        OpsError::UnknownAction(_) => StatusCode::NOT_FOUND,
        OpsError::Execution(_) | OpsError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Ops(err) => {
                let status = status_for(err);
                if status.is_server_error() {
                    tracing::error!(kind = err.kind(), error = %err, "request failed");
                }
                (
                    status,
                    ErrorBody {
                        error: err.to_string(),
                        detail: err.detail().cloned(),
                    },
                )
            }
            ApiError::BadJson(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                    detail: None,
                },
            ),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody {
                    error: self.to_string(),
                    detail: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
