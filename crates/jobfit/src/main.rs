//! Jobfit operator CLI.
//!
//! Inspect the effective configuration, render cache keys and check how an
//! upstream failure would be classified.

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, classify_failure, render_key, show_config};

    let cli = Cli::parse();

    jobfit::init_telemetry(cli.log_json)?;

    match cli.command {
        Commands::Config { file } => {
            show_config(file.as_deref())?;
        }

        Commands::Key {
            identity,
            resource,
            operation,
        } => {
            render_key(&identity, &resource, operation);
        }

        Commands::Classify { status, message } => {
            classify_failure(status, message.as_deref())?;
        }
    }

    Ok(())
}
