//! ptero-ops - provisioning and fleet operations for Pterodactyl panels

use clap::Parser;
use ptero_ops::cli::Cli;
use ptero_ops::output::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.default_log_level());

    let as_json = cli.json;
    if let Err(e) = cli.run().await {
        match json::format_error(&e) {
            Ok(body) if as_json => println!("{body}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for `--json`.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
