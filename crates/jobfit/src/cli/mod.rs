//! CLI command definitions and handlers.

mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::{classify_failure, render_key, show_config};
