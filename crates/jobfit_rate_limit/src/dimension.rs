//! Rate limit dimensions.

use jobfit_core::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An independent counter family with its own limit and window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Dimension {
    /// Requests per user over the long window
    PerUser,
    /// Requests per client IP
    PerIp,
    /// Requests per user over the short burst window
    Burst,
}

impl Dimension {
    /// Maximum admitted requests per window.
    pub fn limit(self, config: &RateLimitConfig) -> u32 {
        match self {
            Dimension::PerUser => *config.per_user_limit(),
            Dimension::PerIp => *config.per_ip_limit(),
            Dimension::Burst => *config.burst_limit(),
        }
    }

    /// Window length.
    pub fn window(self, config: &RateLimitConfig) -> Duration {
        let ms = match self {
            Dimension::PerUser => *config.per_user_window_ms(),
            Dimension::PerIp => *config.per_ip_window_ms(),
            Dimension::Burst => *config.burst_window_ms(),
        };
        Duration::from_millis(ms)
    }
}
