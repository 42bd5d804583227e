//! Caller credentials for the control-plane API.
//!
//! Pure validation only. A `Credentials` value exists only if the host is an
//! absolute http(s) URL and an admin-scope token is present.

use std::fmt;

use url::Url;

use crate::domain::error::OpsError;

pub const MISSING_CREDENTIALS: &str = "Missing Credentials (Host/PTLA)";

/// Validated, request-scoped credentials.
#[derive(Clone)]
pub struct Credentials {
    host: String,
    admin_token: String,
    client_token: Option<String>,
}

impl Credentials {
    /// Validate raw credential fields as received from the caller.
    ///
    /// Empty strings count as absent. The host has trailing `/` removed.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Auth`] if the host or admin token is missing, or if
    /// the host is not an absolute `http`/`https` URL.
    pub fn from_parts(
        host: Option<&str>,
        admin_token: Option<&str>,
        client_token: Option<&str>,
    ) -> Result<Self, OpsError> {
        let host = non_blank(host).ok_or_else(|| OpsError::Auth(MISSING_CREDENTIALS.into()))?;
        let admin_token =
            non_blank(admin_token).ok_or_else(|| OpsError::Auth(MISSING_CREDENTIALS.into()))?;

        let host = normalize_host(host);
        let parsed = Url::parse(&host)
            .map_err(|e| OpsError::Auth(format!("invalid control-plane host {host:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(OpsError::Auth(format!(
                "control-plane host must be an http(s) URL (got {host:?})"
            )));
        }

        Ok(Self {
            host,
            admin_token: admin_token.to_string(),
            client_token: non_blank(client_token).map(str::to_string),
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    #[must_use]
    pub fn client_token(&self) -> Option<&str> {
        self.client_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("admin_token", &"<redacted>")
            .field(
                "client_token",
                &self.client_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Trim surrounding whitespace and any trailing `/`.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
