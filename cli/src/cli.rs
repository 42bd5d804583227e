//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Provision Pterodactyl hosts and operate their fleets
#[derive(Parser)]
#[command(
    name = "ptero-ops",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also set by `NO_COLOR`)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway (/api/panel, /api/install)
    Serve(commands::serve::ServeArgs),

    /// Install the panel stack on a remote host over SSH
    Provision(commands::provision::ProvisionArgs),

    /// Run one fleet action against a control plane
    Fleet(commands::fleet::FleetArgs),

    /// Preview the rendered install plan
    Plan(commands::plan::PlanArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Log level used when `RUST_LOG` is unset. The gateway logs requests;
    /// one-shot commands stay quiet unless something goes wrong.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        match self.command {
            Command::Serve(_) => "info",
            _ => "warn",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;

        if let Command::Version = command {
            commands::version::run(json);
            return Ok(());
        }

        let app = AppContext::new(OutputFlags {
            no_color,
            quiet,
            json,
        })?;

        match command {
            Command::Serve(args) => commands::serve::run(&app, args).await,
            Command::Provision(args) => commands::provision::run(&app, args).await,
            Command::Fleet(args) => commands::fleet::run(&app, args).await,
            Command::Plan(args) => commands::plan::run(&app, &args),
            Command::Version => Ok(()),
        }
    }
}
