//! Application service: unattended remote provisioning use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! The remote shell is injected, so the same flow backs `ptero-ops provision`
//! and `POST /api/install`.

use crate::application::ports::{ProgressReporter, RemoteShell};
use crate::domain::{InstallPlan, InstallProfile, OpsResult, RemoteTarget};

/// Advisory returned once the installer has been handed to the remote host.
pub const ACCEPTED_MESSAGE: &str = "Install dispatched. The host is working in the background; \
allow 5-10 minutes, then open the panel domain or check the remote install log.";

/// Result of a dispatched provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReceipt {
    pub accepted: bool,
    pub message: String,
    /// Remote path collecting installer output.
    pub log_file: String,
    pub stages: usize,
}

/// Render the plan for `target`, open one session, send the composite
/// command and close the session.
///
/// Nothing is sent if rendering fails. The session is closed on both the
/// success and the dispatch-failure path.
///
/// # Errors
///
/// - [`crate::domain::OpsError::Validation`] if the target or profile is
///   invalid; no session is opened.
/// - [`crate::domain::OpsError::Connection`] if the session cannot be opened.
/// - [`crate::domain::OpsError::Execution`] if the command is refused.
pub async fn provision<S: RemoteShell + ?Sized>(
    shell: &S,
    plan: &InstallPlan,
    profile: &InstallProfile,
    target: &RemoteTarget,
    reporter: &impl ProgressReporter,
) -> OpsResult<ProvisionReceipt> {
    target.validate()?;
    profile.validate()?;
    let rendered = plan.render(target, profile)?;
    let command = rendered.composite_command();

    reporter.step(&format!("connecting to {} as {}", target.address(), target.user));
    let mut session = shell.open(target).await?;

    reporter.step(&format!(
        "dispatching {} install stages ({} answers)",
        rendered.stages.len(),
        plan.answer_count()
    ));
    let dispatched = session.dispatch(&command).await;
    session.close().await;
    dispatched?;

    tracing::info!(
        ip = %target.ip,
        port = target.ssh_port,
        stages = rendered.stages.len(),
        log_file = %rendered.log_file,
        "install dispatched"
    );
    reporter.success(&format!(
        "installer running in background on {} (log: {})",
        target.ip, rendered.log_file
    ));

    Ok(ProvisionReceipt {
        accepted: true,
        message: ACCEPTED_MESSAGE.to_string(),
        log_file: rendered.log_file,
        stages: rendered.stages.len(),
    })
}
