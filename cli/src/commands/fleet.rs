//! `ptero-ops fleet`: run one fleet action against a control plane.

use anyhow::{Context, Result};
use clap::Args;
use ptero_common::{FleetRequest, ServerRecord};
use serde_json::Value;

use crate::app::AppContext;
use crate::application::services::fleet::{self, FleetOutcome};
use crate::domain::FleetAction;
use crate::infra::control_plane::HttpConnector;
use crate::output::{OutputContext, progress};

/// Arguments for the fleet command.
#[derive(Args)]
pub struct FleetArgs {
    /// Action name (check_connection, get_stats, nuke_all, ...)
    pub action: String,

    /// Control plane base URL
    #[arg(long, env = "PTERO_OPS_HOST")]
    pub host: Option<String>,

    /// Admin-scope API token
    #[arg(long, env = "PTERO_OPS_PTLA", hide_env_values = true)]
    pub ptla: Option<String>,

    /// Owner-scope API token
    #[arg(long, env = "PTERO_OPS_PTLC", hide_env_values = true)]
    pub ptlc: Option<String>,

    /// Action payload as a JSON object
    #[arg(long)]
    pub payload: Option<String>,
}

impl FleetArgs {
    fn into_request(self) -> Result<FleetRequest> {
        let payload = match self.payload.as_deref() {
            Some(raw) => serde_json::from_str(raw).context("--payload is not valid JSON")?,
            None => Value::Null,
        };
        Ok(FleetRequest {
            host: self.host,
            ptla: self.ptla,
            ptlc: self.ptlc,
            action: Some(self.action),
            payload,
        })
    }
}

/// Run the fleet command.
///
/// # Errors
///
/// Returns an error if the payload is malformed, credentials are missing, or
/// the action fails.
pub async fn run(app: &AppContext, args: FleetArgs) -> Result<()> {
    let ctx = &app.output;
    if let Ok(action) = args.action.parse::<FleetAction>()
        && action.is_destructive()
        && !app.is_json()
    {
        ctx.danger(&format!("{action} deletes resources on the control plane"));
    }

    let request = args.into_request()?;
    let connector = HttpConnector::new().context("cannot build HTTP client")?;
    let policy = app.config.policy();

    let pb = progress::spinner_if(
        ctx.show_progress(),
        &format!("running {}", request.action.as_deref().unwrap_or_default()),
    );
    let outcome = match fleet::execute(&connector, &request, &policy).await {
        Ok(outcome) => {
            progress::finish_ok(&pb, &outcome.summary());
            outcome
        }
        Err(e) => {
            progress::finish_error(&pb, "failed");
            return Err(e.into());
        }
    };

    if app.is_json() {
        return ctx.print_json(&outcome);
    }
    if !ctx.show_progress() {
        ctx.success(&outcome.summary());
    }
    print_details(ctx, &outcome);
    Ok(())
}

fn print_details(ctx: &OutputContext, outcome: &FleetOutcome) {
    match outcome {
        FleetOutcome::Inventory(inv) => {
            ctx.header("Users");
            for u in &inv.users {
                let user = &u.attributes;
                ctx.kv(&user.id.to_string(), &format!("{} <{}>", user.username, user.email));
            }
            ctx.header("Servers");
            for s in &inv.servers {
                let server = &s.attributes;
                ctx.kv(&server.id.to_string(), &server.name);
            }
        }
        FleetOutcome::FullInventory(inv) => {
            ctx.header("Servers");
            for ServerRecord {
                server,
                runtime_state,
            } in &inv.servers
            {
                let server = &server.attributes;
                ctx.kv(
                    &server.id.to_string(),
                    &format!("{}  [{}]", server.name, runtime_state.as_str()),
                );
            }
        }
        FleetOutcome::Pruned(report) => {
            for e in &report.batch.errors {
                ctx.warn(&format!("server {}: {}", e.entity_id, e.cause));
            }
        }
        FleetOutcome::Wiped(report) => {
            for e in report.servers.errors.iter().chain(&report.users.errors) {
                ctx.warn(&format!("{}: {}", e.entity_id, e.cause));
            }
        }
        _ => {}
    }
}
