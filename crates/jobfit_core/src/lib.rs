//! Core data types for the Jobfit analysis orchestrator.
//!
//! This crate provides the types shared by the cache, rate limiter, retry and
//! orchestration crates: requests and results, cache keys, the injectable
//! [`Clock`], policy configuration, periodic sweep tasks and logging setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod key;
mod request;
mod result;
mod sweeper;
mod telemetry;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock, to_chrono};
pub use config::{CacheConfig, JobfitConfig, RateLimitConfig, RetryConfig};
pub use key::CacheKey;
pub use request::{
    AnalysisContext, AnalysisContextBuilder, AnalysisRequest, AnalysisRequestBuilder,
    ContextField, OperationKind,
};
pub use result::AnalysisResult;
pub use sweeper::{SweepHandle, spawn_sweeper};
pub use telemetry::{DEFAULT_FILTER, init_telemetry};
