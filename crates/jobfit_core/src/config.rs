//! Configuration for the orchestration layer.
//!
//! Every numeric policy constant (window sizes, limits, TTL, retry schedule, cache
//! capacity) is injected through [`JobfitConfig`]. The configuration system supports:
//! - Bundled defaults (include_str! from jobfit.toml)
//! - User overrides (~/.config/jobfit/jobfit.toml, then ./jobfit.toml)
//! - Environment overrides (`JOBFIT__RETRY__MAX_ATTEMPTS=5`)

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use jobfit_error::{ConfigError, JobfitError, JobfitResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fixed-window rate limits for the three limiter dimensions.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// per_user_limit = 5
/// per_user_window_ms = 60_000
/// burst_limit = 2
/// burst_window_ms = 10_000
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per user per window
    per_user_limit: u32,
    /// Per-user window length (milliseconds)
    per_user_window_ms: u64,
    /// Requests allowed per client IP per window
    per_ip_limit: u32,
    /// Per-IP window length (milliseconds)
    per_ip_window_ms: u64,
    /// Requests allowed per user per burst window
    burst_limit: u32,
    /// Burst window length (milliseconds)
    burst_window_ms: u64,
    /// How often expired windows are swept (milliseconds)
    sweep_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_user_limit: 5,
            per_user_window_ms: 60_000,
            per_ip_limit: 20,
            per_ip_window_ms: 300_000,
            burst_limit: 2,
            burst_window_ms: 10_000,
            sweep_interval_ms: 300_000,
        }
    }
}

impl RateLimitConfig {
    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("per_user_limit", self.per_user_limit),
            ("per_ip_limit", self.per_ip_limit),
            ("burst_limit", self.burst_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::invalid(
                    format!("rate_limit.{}", name),
                    "must be greater than zero",
                ));
            }
        }
        let windows = [
            ("per_user_window_ms", self.per_user_window_ms),
            ("per_ip_window_ms", self.per_ip_window_ms),
            ("burst_window_ms", self.burst_window_ms),
            ("sweep_interval_ms", self.sweep_interval_ms),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::invalid(
                    format!("rate_limit.{}", name),
                    "must be greater than zero",
                ));
            }
        }
        Ok(())
    }
}

/// TTL cache settings for both cache layers.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of a cached analysis (milliseconds)
    ttl_ms: u64,
    /// Capacity of the in-process layer
    max_entries: usize,
    /// Capacity of the durable layer
    durable_max_entries: usize,
    /// How often expired entries are swept (milliseconds)
    sweep_interval_ms: u64,
    /// Directory of the file-backed durable layer; in-memory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    durable_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 1_800_000,
            max_entries: 100,
            durable_max_entries: 500,
            sweep_interval_ms: 300_000,
            durable_path: None,
        }
    }
}

impl CacheConfig {
    /// TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_ms == 0 {
            return Err(ConfigError::invalid("cache.ttl_ms", "must be greater than zero"));
        }
        if self.max_entries == 0 {
            return Err(ConfigError::invalid("cache.max_entries", "must be greater than zero"));
        }
        if self.durable_max_entries == 0 {
            return Err(ConfigError::invalid(
                "cache.durable_max_entries",
                "must be greater than zero",
            ));
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "cache.sweep_interval_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Retry schedule for upstream calls.
///
/// Delay before retry `n` is `min(base_delay_ms * backoff_factor^(n-1), max_delay_ms)`
/// with jitter applied on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    base_delay_ms: u64,
    /// Multiplier applied per retry
    backoff_factor: f64,
    /// Upper bound on a single delay (milliseconds)
    max_delay_ms: u64,
    /// Jitter amplitude as a fraction of the delay
    jitter: f64,
    /// Deadline for a single attempt (milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    attempt_timeout_ms: Option<u64>,
    /// Deadline across all attempts (milliseconds); unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    overall_timeout_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 10_000,
            jitter: 0.25,
            attempt_timeout_ms: Some(30_000),
            overall_timeout_ms: None,
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigError::invalid("retry.backoff_factor", "must be at least 1.0"));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::invalid("retry.jitter", "must be within [0.0, 1.0]"));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::invalid(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(ConfigError::invalid(
                "retry.attempt_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.overall_timeout_ms == Some(0) {
            return Err(ConfigError::invalid(
                "retry.overall_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Top-level Jobfit configuration.
///
/// Loads policy from TOML files with a precedence system:
/// 1. Bundled defaults (include_str! from jobfit.toml)
/// 2. User config in home directory (~/.config/jobfit/jobfit.toml)
/// 3. User config in current directory (./jobfit.toml)
/// 4. Environment variables prefixed `JOBFIT__`
///
/// # Example
///
/// ```no_run
/// use jobfit_core::JobfitConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = JobfitConfig::load()?;
/// println!("per-user limit: {}", config.rate_limit().per_user_limit());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct JobfitConfig {
    /// Rate limiter policy
    rate_limit: RateLimitConfig,
    /// Cache policy
    cache: CacheConfig,
    /// Retry policy
    retry: RetryConfig,
}

impl JobfitConfig {
    /// Load configuration from a specific file path.
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> JobfitResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                JobfitError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                JobfitError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: environment > current dir > home dir > bundled.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be parsed or the merged result
    /// fails validation.
    #[instrument]
    pub fn load() -> JobfitResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        // Bundled default configuration
        const DEFAULT_CONFIG: &str = include_str!("../../../jobfit.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/jobfit/jobfit.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("jobfit").required(false))
            .add_source(
                Environment::with_prefix("JOBFIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(|e| {
                JobfitError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                JobfitError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every policy value is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending option.
    pub fn validate(&self) -> JobfitResult<()> {
        self.rate_limit.validate()?;
        self.cache.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}
