//! Configuration error types.

use std::fmt;

/// Configuration error naming the offending option, with source location.
///
/// Load and parse failures have no single option at fault and leave
/// `option` empty.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Dotted option path such as `rate_limit.burst_limit`
    pub option: Option<String>,
    /// What is wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Error not tied to one option, such as an unreadable file.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobfit_error::ConfigError;
    ///
    /// let err = ConfigError::new("Failed to read configuration from ./jobfit.toml");
    /// assert!(err.option.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            option: None,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// An option holds an unusable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobfit_error::ConfigError;
    ///
    /// let err = ConfigError::invalid("rate_limit.burst_limit", "must be greater than zero");
    /// assert_eq!(err.option(), Some("rate_limit.burst_limit"));
    /// assert!(err.to_string().contains("rate_limit.burst_limit must be greater than zero"));
    /// ```
    #[track_caller]
    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            option: Some(option.into()),
            message: reason.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// The offending option, if one is at fault.
    pub fn option(&self) -> Option<&str> {
        self.option.as_deref()
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.option {
            Some(option) => write!(f, "Configuration Error: {} {}", option, self.message)?,
            None => write!(f, "Configuration Error: {}", self.message)?,
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_option() {
        let err = ConfigError::invalid("retry.jitter", "must be within [0.0, 1.0]");
        let shown = err.to_string();
        assert!(shown.starts_with("Configuration Error: retry.jitter must be within"));
        assert!(shown.contains("config.rs"));
    }

    #[test]
    fn test_load_failure_has_no_option() {
        let err = ConfigError::new("Failed to parse configuration");
        assert_eq!(err.option(), None);
        assert!(err.to_string().starts_with("Configuration Error: Failed to parse"));
    }
}
