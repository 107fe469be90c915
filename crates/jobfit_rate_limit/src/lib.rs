//! Fixed-window rate limiting.
//!
//! Requests are counted per [`Dimension`] and identity (user id or client IP).
//! Each dimension has its own limit and window length from
//! [`RateLimitConfig`](jobfit_core::RateLimitConfig). A window that has reached
//! its limit rejects further requests until it resets; rejected requests are
//! not counted.
//!
//! ```
//! use jobfit_core::{ManualClock, RateLimitConfig};
//! use jobfit_rate_limit::{Dimension, RateLimiter};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(RateLimitConfig::default(), Arc::new(ManualClock::default()));
//! let decision = limiter.check(Dimension::Burst, "userA").await;
//! assert!(decision.allowed());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dimension;
mod ip;
mod limiter;
mod window;

pub use dimension::Dimension;
pub use ip::{UNKNOWN_IP, client_ip};
pub use limiter::RateLimiter;
pub use window::{RateDecision, RateWindow};
