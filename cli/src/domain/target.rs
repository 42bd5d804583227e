//! Remote provisioning target and its validators.
//!
//! Every value that ends up inside the remote command is validated here, so
//! the rendered install script cannot be steered by caller input.

use std::fmt;

use ptero_common::ProvisionRequest;

use crate::domain::error::OpsError;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_SSH_USER: &str = "root";

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A host to provision plus the parameters substituted into the install plan.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub ip: String,
    pub ssh_port: u16,
    pub user: String,
    pub password: String,
    pub panel_domain: String,
    pub node_domain: String,
    pub memory_mb: u64,
}

impl RemoteTarget {
    /// Build a target from the dashboard request, applying defaults and
    /// validating every field.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Validation`] naming the first invalid field.
    pub fn from_request(req: &ProvisionRequest) -> Result<Self, OpsError> {
        let memory_mb = req
            .ram
            .as_ref()
            .and_then(ptero_common::NumericValue::as_u64)
            .ok_or_else(|| OpsError::Validation("ram must be a positive integer (MB)".into()))?;

        let target = Self {
            ip: req.ip.clone().unwrap_or_default().trim().to_string(),
            ssh_port: req.port.unwrap_or(DEFAULT_SSH_PORT),
            user: req
                .user
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_SSH_USER)
                .to_string(),
            password: req.pw.clone().unwrap_or_default(),
            panel_domain: req.dom_pnl.clone().unwrap_or_default().trim().to_string(),
            node_domain: req.dom_node.clone().unwrap_or_default().trim().to_string(),
            memory_mb,
        };
        target.validate()?;
        Ok(target)
    }

    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns [`OpsError::Validation`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), OpsError> {
        if self.ip.is_empty() || self.ip.chars().any(char::is_whitespace) {
            return Err(OpsError::Validation("ip must be a non-empty host address".into()));
        }
        if self.ssh_port == 0 {
            return Err(OpsError::Validation("ssh port must be non-zero".into()));
        }
        if self.user.is_empty() || self.user.chars().any(char::is_whitespace) {
            return Err(OpsError::Validation("ssh user must be a single word".into()));
        }
        if self.password.is_empty() {
            return Err(OpsError::Validation("ssh password is required".into()));
        }
        if !is_valid_hostname(&self.panel_domain) {
            return Err(OpsError::Validation(format!(
                "panel domain {:?} is not a valid hostname",
                self.panel_domain
            )));
        }
        if !is_valid_hostname(&self.node_domain) {
            return Err(OpsError::Validation(format!(
                "node domain {:?} is not a valid hostname",
                self.node_domain
            )));
        }
        if self.memory_mb == 0 {
            return Err(OpsError::Validation("ram must be a positive integer (MB)".into()));
        }
        Ok(())
    }

    /// `ip:port` string for logs and socket resolution.
    #[must_use]
    pub fn address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.ssh_port)
        } else {
            format!("{}:{}", self.ip, self.ssh_port)
        }
    }
}

impl fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTarget")
            .field("ip", &self.ip)
            .field("ssh_port", &self.ssh_port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("panel_domain", &self.panel_domain)
            .field("node_domain", &self.node_domain)
            .field("memory_mb", &self.memory_mb)
            .finish()
    }
}

/// DNS hostname check: dot-separated labels of `[A-Za-z0-9-]`, no label
/// starting or ending with `-`, at most 253 characters overall.
#[must_use]
pub fn is_valid_hostname(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}
