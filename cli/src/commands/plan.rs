//! `ptero-ops plan`: preview the rendered install plan without connecting.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::domain::RemoteTarget;
use crate::domain::install_plan::RenderedPlan;
use crate::domain::target::{DEFAULT_SSH_PORT, DEFAULT_SSH_USER};

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// Panel domain
    #[arg(long)]
    pub panel_domain: String,

    /// Node domain
    #[arg(long)]
    pub node_domain: String,

    /// Memory allocated to the node, in MB
    #[arg(long)]
    pub memory_mb: u64,

    /// Print the exact detached command instead of the stage listing
    #[arg(long)]
    pub command: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanPreview<'a> {
    log_file: &'a str,
    stages: Vec<StagePreview<'a>>,
    command: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StagePreview<'a> {
    name: &'a str,
    script_url: &'a str,
    answers: &'a [String],
}

/// Run the plan command.
///
/// The admin password is always masked in the preview.
///
/// # Errors
///
/// Returns an error if the plan file is invalid or a domain is malformed.
pub fn run(app: &AppContext, args: &PlanArgs) -> Result<()> {
    let target = RemoteTarget {
        ip: "preview".to_string(),
        ssh_port: DEFAULT_SSH_PORT,
        user: DEFAULT_SSH_USER.to_string(),
        password: "preview".to_string(),
        panel_domain: args.panel_domain.clone(),
        node_domain: args.node_domain.clone(),
        memory_mb: args.memory_mb,
    };
    target.validate()?;

    let plan = app.install_plan()?;
    let rendered = plan.render(&target, &app.config.preview_profile())?;

    if app.is_json() {
        return app.output.print_json(&preview(&rendered));
    }
    if args.command {
        println!("{}", rendered.composite_command());
        return Ok(());
    }

    let ctx = &app.output;
    ctx.kv("log file", &rendered.log_file);
    for stage in &rendered.stages {
        println!();
        ctx.header(&format!("{} ({} answers)", stage.name, stage.answers.len()));
        ctx.kv("script", &stage.script_url);
        for (i, answer) in stage.answers.iter().enumerate() {
            ctx.kv(&format!("{:>3}", i + 1), answer);
        }
    }
    Ok(())
}

fn preview(rendered: &RenderedPlan) -> PlanPreview<'_> {
    PlanPreview {
        log_file: &rendered.log_file,
        stages: rendered
            .stages
            .iter()
            .map(|s| StagePreview {
                name: &s.name,
                script_url: &s.script_url,
                answers: &s.answers,
            })
            .collect(),
        command: rendered.composite_command(),
    }
}
