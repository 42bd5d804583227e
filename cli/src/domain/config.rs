//! Process configuration schema and validators.
//!
//! Pure functions only. `infra::config` fills [`OpsConfig`] from the
//! environment; everything here works on the deserialized value.

use std::fmt;

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::error::ConfigError;
use crate::domain::fleet::{FleetPolicy, ServerTemplate};
use crate::domain::install_plan::InstallProfile;

// ── Constants ────────────────────────────────────────────────────────────────

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "PTERO_OPS_";

// ── Config schema ────────────────────────────────────────────────────────────

/// Every tunable the gateway and CLI read at startup.
///
/// Field `foo_bar` is read from `PTERO_OPS_FOO_BAR`.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OpsConfig {
    pub listen_addr: String,
    /// Shared secret gating `/api/install`.
    pub install_key: Option<String>,
    /// YAML file replacing the embedded install plan.
    pub install_plan_path: Option<String>,

    pub admin_user: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
    pub timezone: String,
    pub location: String,

    pub stats_page_size: u32,
    pub prune_fetch_page_size: u32,
    pub prune_scan_limit: usize,
    pub wipe_page_size: u32,
    pub wipe_confirm_token: String,
    pub treat_unknown_as_offline: bool,
    pub prune_stopping: bool,
    pub rollback_orphaned_users: bool,
    pub user_email_domain: String,

    pub template_egg: u64,
    pub template_docker_image: String,
    pub template_startup: String,
    pub template_allocation: u64,
    pub template_memory_mb: u64,
    pub template_disk_mb: u64,
    pub template_cpu_percent: u64,
}

impl Default for OpsConfig {
    fn default() -> Self {
        let policy = FleetPolicy::default();
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            install_key: None,
            install_plan_path: None,
            admin_user: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
            timezone: "UTC".to_string(),
            location: "main".to_string(),
            stats_page_size: policy.stats_page_size,
            prune_fetch_page_size: policy.prune_fetch_page_size,
            prune_scan_limit: policy.prune_scan_limit,
            wipe_page_size: policy.wipe_page_size,
            wipe_confirm_token: policy.wipe_confirm_token,
            treat_unknown_as_offline: policy.treat_unknown_as_offline,
            prune_stopping: policy.prune_stopping,
            rollback_orphaned_users: policy.rollback_orphaned_users,
            user_email_domain: policy.user_email_domain,
            template_egg: policy.template.egg,
            template_docker_image: policy.template.docker_image,
            template_startup: policy.template.startup,
            template_allocation: policy.template.allocation,
            template_memory_mb: policy.template.memory_mb,
            template_disk_mb: policy.template.disk_mb,
            template_cpu_percent: policy.template.cpu_percent,
        }
    }
}

impl fmt::Debug for OpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = |v: Option<&str>| v.map(|_| "<redacted>");
        f.debug_struct("OpsConfig")
            .field("listen_addr", &self.listen_addr)
            .field("install_key", &secret(self.install_key.as_deref()))
            .field("install_plan_path", &self.install_plan_path)
            .field("admin_user", &self.admin_user)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &secret(self.admin_password.as_deref()))
            .field("timezone", &self.timezone)
            .field("location", &self.location)
            .field("policy", &self.policy())
            .finish_non_exhaustive()
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

impl OpsConfig {
    /// Checks shared by every entry point: page sizes and the wipe guard.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var, size) in [
            ("STATS_PAGE_SIZE", self.stats_page_size),
            ("PRUNE_FETCH_PAGE_SIZE", self.prune_fetch_page_size),
            ("WIPE_PAGE_SIZE", self.wipe_page_size),
        ] {
            if size == 0 {
                return Err(invalid(var, "must be greater than zero"));
            }
        }
        if self.prune_scan_limit == 0 {
            return Err(invalid("PRUNE_SCAN_LIMIT", "must be greater than zero"));
        }
        if self.wipe_confirm_token.trim().is_empty() {
            return Err(invalid("WIPE_CONFIRM_TOKEN", "must not be blank"));
        }
        if self.user_email_domain.trim().is_empty() || self.user_email_domain.contains('@') {
            return Err(invalid("USER_EMAIL_DOMAIN", "must be a bare domain"));
        }
        Ok(())
    }

    /// Checks required before the HTTP gateway may start.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the shared secret or provisioning profile
    /// is missing, or if [`OpsConfig::validate`] fails.
    pub fn validate_for_serve(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.install_key()?;
        self.profile()?;
        Ok(())
    }

    /// Fleet limits and switches.
    #[must_use]
    pub fn policy(&self) -> FleetPolicy {
        FleetPolicy {
            stats_page_size: self.stats_page_size,
            prune_fetch_page_size: self.prune_fetch_page_size,
            prune_scan_limit: self.prune_scan_limit,
            wipe_page_size: self.wipe_page_size,
            wipe_confirm_token: self.wipe_confirm_token.clone(),
            treat_unknown_as_offline: self.treat_unknown_as_offline,
            prune_stopping: self.prune_stopping,
            rollback_orphaned_users: self.rollback_orphaned_users,
            user_email_domain: self.user_email_domain.clone(),
            template: ServerTemplate {
                egg: self.template_egg,
                docker_image: self.template_docker_image.clone(),
                startup: self.template_startup.clone(),
                allocation: self.template_allocation,
                memory_mb: self.template_memory_mb,
                disk_mb: self.template_disk_mb,
                cpu_percent: self.template_cpu_percent,
            },
        }
    }

    /// Operator identity for the install plan.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] without an admin password and
    /// [`ConfigError::Invalid`] if any profile field is blank or multi-line.
    pub fn profile(&self) -> Result<InstallProfile, ConfigError> {
        let admin_password = required("ADMIN_PASSWORD", self.admin_password.as_deref())?;
        let profile = InstallProfile {
            admin_user: self.admin_user.clone(),
            admin_email: self.admin_email.clone(),
            admin_password: admin_password.to_string(),
            timezone: self.timezone.clone(),
            location: self.location.clone(),
        };
        profile
            .validate()
            .map_err(|e| invalid("ADMIN_*", &e.to_string()))?;
        Ok(profile)
    }

    /// Operator identity with the password masked, for plan previews.
    /// Does not require `ADMIN_PASSWORD`.
    #[must_use]
    pub fn preview_profile(&self) -> InstallProfile {
        InstallProfile {
            admin_user: self.admin_user.clone(),
            admin_email: self.admin_email.clone(),
            admin_password: String::new(),
            timezone: self.timezone.clone(),
            location: self.location.clone(),
        }
        .redacted()
    }

    /// The provisioning shared secret, pre-hashed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `INSTALL_KEY` is unset or blank.
    pub fn install_key(&self) -> Result<InstallKey, ConfigError> {
        required("INSTALL_KEY", self.install_key.as_deref()).map(InstallKey::new)
    }
}

fn required<'a>(var: &str, value: Option<&'a str>) -> Result<&'a str, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            var: format!("{ENV_PREFIX}{var}"),
        })
}

fn invalid(var: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var: format!("{ENV_PREFIX}{var}"),
        reason: reason.to_string(),
    }
}

// ── Shared secret ────────────────────────────────────────────────────────────

/// SHA-256 digest of the provisioning shared secret.
///
/// Candidates are hashed before comparison so the raw secret is never
/// compared byte by byte.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallKey([u8; 32]);

impl InstallKey {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        Self(digest)
    }

    /// Whether `candidate` is the configured secret. `None` never matches.
    #[must_use]
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| Sha256::digest(c.as_bytes()).as_slice() == self.0.as_slice())
    }
}

impl fmt::Debug for InstallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InstallKey(<redacted>)")
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
