//! Configuration loading: `PTERO_OPS_*` environment variables and the
//! optional install plan file.

use anyhow::{Context, Result};

use crate::domain::config::ENV_PREFIX;
use crate::domain::{InstallPlan, OpsConfig};

/// Read `PTERO_OPS_*` from the process environment.
///
/// # Errors
///
/// Returns an error if a variable cannot be parsed into its field type.
pub fn load_from_env() -> Result<OpsConfig> {
    envy::prefixed(ENV_PREFIX)
        .from_env::<OpsConfig>()
        .context("cannot read PTERO_OPS_* configuration")
}

/// Same as [`load_from_env`] over explicit `(name, value)` pairs.
///
/// # Errors
///
/// Returns an error if a variable cannot be parsed into its field type.
pub fn load_from_iter<I>(vars: I) -> Result<OpsConfig>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::prefixed(ENV_PREFIX)
        .from_iter::<_, OpsConfig>(vars)
        .context("cannot read PTERO_OPS_* configuration")
}

/// The configured install plan, or the embedded one.
///
/// # Errors
///
/// Returns an error if the plan file cannot be read or is invalid.
pub fn load_plan(config: &OpsConfig) -> Result<InstallPlan> {
    match config.install_plan_path.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read install plan {path}"))?;
            InstallPlan::from_yaml(&raw).with_context(|| format!("invalid install plan {path}"))
        }
        None => InstallPlan::embedded().context("embedded install plan is invalid"),
    }
}
