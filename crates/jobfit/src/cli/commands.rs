//! CLI command definitions.

use clap::{ArgGroup, Parser, Subcommand};
use jobfit::OperationKind;
use std::path::PathBuf;

/// Jobfit - caching, rate limiting and retry for AI job-application analysis
#[derive(Parser, Debug)]
#[command(name = "jobfit")]
#[command(about = "Caching, rate limiting and retry for AI job-application analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as TOML
    Config {
        /// Read this file instead of the layered defaults
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Render the cache key for a request
    Key {
        /// User identity
        #[arg(long)]
        identity: String,

        /// Job or application id
        #[arg(long)]
        resource: String,

        /// Analysis operation (jobFit, coverLetter, interviewPrep, resumeTailoring, skillGap)
        #[arg(long, default_value = "jobFit")]
        operation: OperationKind,
    },

    /// Show how an upstream failure is classified
    #[command(group(ArgGroup::new("failure").required(true).multiple(true).args(["status", "message"])))]
    Classify {
        /// HTTP status code
        #[arg(long)]
        status: Option<u16>,

        /// Error message text
        #[arg(long)]
        message: Option<String>,
    },
}
