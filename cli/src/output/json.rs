//! JSON output helpers.
//!
//! `--json` output uses the same bodies the HTTP gateway returns, so scripts
//! can treat the CLI and the gateway interchangeably.

use anyhow::{Context, Result};
use ptero_common::ErrorBody;
use serde::Serialize;

use crate::domain::OpsError;

/// Pretty-print any serializable value.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}

/// Format a failure as the `{error, detail?}` body.
///
/// Domain errors keep their structured detail; anything else is reported by
/// its full context chain.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(err: &anyhow::Error) -> Result<String> {
    let body = match err.downcast_ref::<OpsError>() {
        Some(ops) => ErrorBody {
            error: ops.to_string(),
            detail: ops.detail().cloned(),
        },
        None => ErrorBody {
            error: format!("{err:#}"),
            detail: None,
        },
    };
    to_pretty(&body)
}
