//! `ptero-ops provision`: install the panel stack on a remote host.

use anyhow::Result;
use clap::Args;
use ptero_common::ProvisionResponse;

use crate::app::AppContext;
use crate::application::services::provision::provision;
use crate::domain::RemoteTarget;
use crate::domain::target::{DEFAULT_SSH_PORT, DEFAULT_SSH_USER};
use crate::infra::ssh::Ssh2Shell;
use crate::output::reporter::TerminalReporter;

/// Arguments for the provision command.
#[derive(Args)]
pub struct ProvisionArgs {
    /// Target host address
    #[arg(long)]
    pub ip: String,

    /// SSH port
    #[arg(long, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// SSH user
    #[arg(long, default_value = DEFAULT_SSH_USER)]
    pub user: String,

    /// SSH password
    #[arg(long, env = "PTERO_OPS_SSH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Panel domain
    #[arg(long)]
    pub panel_domain: String,

    /// Node domain
    #[arg(long)]
    pub node_domain: String,

    /// Memory allocated to the node, in MB
    #[arg(long)]
    pub memory_mb: u64,
}

impl ProvisionArgs {
    fn target(self) -> RemoteTarget {
        RemoteTarget {
            ip: self.ip,
            ssh_port: self.port,
            user: self.user,
            password: self.password,
            panel_domain: self.panel_domain,
            node_domain: self.node_domain,
            memory_mb: self.memory_mb,
        }
    }
}

/// Run the provision command.
///
/// # Errors
///
/// Returns an error if the target or profile is invalid, the session cannot
/// be opened, or the install command is refused.
pub async fn run(app: &AppContext, args: ProvisionArgs) -> Result<()> {
    let target = args.target();
    target.validate()?;
    let profile = app.config.profile()?;
    let plan = app.install_plan()?;

    let reporter = TerminalReporter::new(&app.output);
    let receipt = provision(&Ssh2Shell, &plan, &profile, &target, &reporter).await?;

    if app.is_json() {
        return app.output.print_json(&ProvisionResponse {
            success: receipt.accepted,
            message: receipt.message,
        });
    }
    app.output.info(&receipt.message);
    app.output.kv("log file", &receipt.log_file);
    Ok(())
}
