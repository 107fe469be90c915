//! CLI command handlers.

use jobfit::{
    AnalysisError, CacheKey, JobfitConfig, JobfitResult, OperationKind, PublicAnalysisError,
    classify_message, classify_status,
};
use std::path::Path;

/// Print the effective configuration.
pub fn show_config(file: Option<&Path>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config(file)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn load_config(file: Option<&Path>) -> JobfitResult<JobfitConfig> {
    match file {
        Some(path) => JobfitConfig::from_file(path),
        None => JobfitConfig::load(),
    }
}

/// Print the storage rendering of a cache key.
pub fn render_key(identity: &str, resource: &str, operation: OperationKind) {
    println!("{}", CacheKey::new(identity, resource, operation));
}

/// Print the classification of a status code and/or message.
///
/// A status code takes precedence; the message then only adds detail.
pub fn classify_failure(
    status: Option<u16>,
    message: Option<&str>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let error = classification(status, message);
    let public = PublicAnalysisError::from(&error);
    println!("{}", serde_json::to_string_pretty(&public)?);
    if let Some(details) = error.details() {
        eprintln!("details: {}", details);
    }
    Ok(())
}

fn classification(status: Option<u16>, message: Option<&str>) -> AnalysisError {
    match (status, message) {
        (Some(status), message) => classify_status(status, message.unwrap_or_default()),
        (None, message) => classify_message(message.unwrap_or_default()),
    }
}
