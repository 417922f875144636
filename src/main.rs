use anyhow::Result;
use clap::{Parser, Subcommand};

use sub_expire_detect::config::Config;
use sub_expire_detect::{logging, App};

/// Reports Pub/Sub subscriptions that disappeared since the previous run.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP trigger (default).
    Serve,
    /// Run a single detection and exit.
    RunOnce,
}

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    logging::init(&config.log)?;

    let app = App::new(config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app.serve().await?,
        Command::RunOnce => {
            let outcome = app.detector.run().await.map_err(|e| {
                tracing::error!(error = %e, detail = ?e, "Invocation failed");
                e
            })?;
            tracing::info!(run_id = %outcome.run_id, "success!");
        }
    }

    Ok(())
}
