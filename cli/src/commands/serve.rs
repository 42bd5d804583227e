//! `ptero-ops serve`: run the HTTP gateway.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::infra::control_plane::HttpConnector;
use crate::infra::ssh::Ssh2Shell;
use crate::server::{self, AppState};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides PTERO_OPS_LISTEN_ADDR)
    #[arg(long)]
    pub listen: Option<String>,
}

/// Run the serve command.
///
/// # Errors
///
/// Returns an error if required configuration is missing, the install plan
/// is invalid, or the listener cannot be bound.
pub async fn run(app: &AppContext, args: ServeArgs) -> Result<()> {
    let config = &app.config;
    config
        .validate_for_serve()
        .context("gateway configuration is incomplete")?;

    let plan = app.install_plan()?;
    let state = AppState {
        connector: Arc::new(HttpConnector::new().context("cannot build HTTP client")?),
        shell: Arc::new(Ssh2Shell),
        policy: config.policy(),
        plan,
        profile: config.profile()?,
        install_key: config.install_key()?,
    };

    let listen_addr = args.listen.unwrap_or_else(|| config.listen_addr.clone());
    tracing::info!(
        listen_addr = %listen_addr,
        stages = state.plan.stages.len(),
        plan_override = config.install_plan_path.is_some(),
        treat_unknown_as_offline = state.policy.treat_unknown_as_offline,
        "configuration loaded",
    );

    server::serve(Arc::new(state), &listen_addr).await
}
