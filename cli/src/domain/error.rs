//! Typed domain error enum.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! Transport layers map each variant to a status code; nothing here knows
//! about HTTP.

use serde_json::Value;
use thiserror::Error;

/// Failure taxonomy shared by the provisioning and fleet components.
#[derive(Debug, Error, PartialEq)]
pub enum OpsError {
    /// Missing or invalid caller credentials or shared secret.
    #[error("{0}")]
    Auth(String),

    /// Malformed input: payload, confirm token, provisioning parameters.
    #[error("{0}")]
    Validation(String),

    #[error("Action unknown: {0}")]
    UnknownAction(String),

    /// Remote session could not be established.
    #[error("remote connection failed: {0}")]
    Connection(String),

    /// Remote session was up but the command could not be submitted.
    #[error("remote command dispatch failed: {0}")]
    Execution(String),

    /// Control-plane call failed or returned an error body.
    #[error("{message}")]
    Upstream {
        message: String,
        status: Option<u16>,
        detail: Option<Value>,
    },
}

/// Convenience alias used by ports and services.
pub type OpsResult<T> = Result<T, OpsError>;

/// Startup configuration problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: String },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },
}

/// Problems found while loading an install plan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("install plan is not valid YAML: {0}")]
    Parse(String),

    #[error("install plan has no stages")]
    NoStages,

    #[error("stage {stage:?} has no answers")]
    EmptyStage { stage: String },

    #[error("stage {stage:?} uses unknown placeholder {{{placeholder}}}\n\nKnown placeholders: {known}")]
    UnknownPlaceholder {
        stage: String,
        placeholder: String,
        known: String,
    },

    #[error("stage {stage:?} answer #{index} must be a single line")]
    MultilineAnswer { stage: String, index: usize },

    #[error("stage {stage:?} script_url {url:?} is not an http(s) URL")]
    InvalidScriptUrl { stage: String, url: String },

    #[error("log_file {0:?} must be a non-empty single-line path")]
    InvalidLogFile(String),
}

impl OpsError {
    /// Upstream failure without a status code or structured body.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            status: None,
            detail: None,
        }
    }

    /// Structured detail attached to the error, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&Value> {
        match self {
            Self::Upstream { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Stable machine-readable name of the variant, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_error",
            Self::Validation(_) => "validation_error",
            Self::UnknownAction(_) => "unknown_action",
            Self::Connection(_) => "connection_error",
            Self::Execution(_) => "execution_error",
            Self::Upstream { .. } => "upstream_error",
        }
    }
}
