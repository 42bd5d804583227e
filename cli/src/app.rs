//! Application context: unified state passed to every command handler.
//!
//! `AppContext` bundles the output context and the process configuration so
//! command signatures stay stable when a cross-cutting concern is added.

use anyhow::Result;

use crate::domain::{InstallPlan, OpsConfig};
use crate::infra;
use crate::output::OutputContext;

/// Output rendering flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode, JSON mode).
    pub output: OutputContext,
    /// `PTERO_OPS_*` configuration.
    pub config: OpsConfig,
}

impl AppContext {
    /// Construct an `AppContext` from CLI flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a `PTERO_OPS_*` variable is malformed or the
    /// configuration fails validation.
    pub fn new(flags: OutputFlags) -> Result<Self> {
        let config = infra::config::load_from_env()?;
        Self::with_config(flags, config)
    }

    /// Same as [`AppContext::new`] with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_config(flags: OutputFlags, config: OpsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet).with_json(flags.json),
            config,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.output.json
    }

    /// The install plan selected by configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan file cannot be read or is invalid.
    pub fn install_plan(&self) -> Result<InstallPlan> {
        infra::config::load_plan(&self.config)
    }
}
