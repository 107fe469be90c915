//! Jobfit - request orchestration for AI job-application analysis
//!
//! Every analysis request (job fit score, cover letter, interview prep, resume
//! tailoring, skill gap) goes through one pipeline:
//!
//! 1. **Validate** required fields for the operation
//! 2. **Cache check** against a memory-over-durable TTL cache
//! 3. **Rate limit** per user burst, per user and per client IP
//! 4. **Call upstream** with classified, retried failures
//! 5. **Write through** the successful result to the cache
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use jobfit::{AnalysisOrchestrator, AnalysisRequest, JobfitConfig, OperationKind};
//! use std::sync::Arc;
//!
//! let orchestrator = AnalysisOrchestrator::from_config(&JobfitConfig::load()?, Arc::new(my_upstream))?;
//! let analysis = orchestrator.generate(request).await?;
//! println!("{} (from {})", analysis.result().value(), analysis.source());
//! ```
//!
//! # Architecture
//!
//! - `jobfit_error` - Error taxonomy and classification
//! - `jobfit_core` - Requests, cache keys, clock, configuration, telemetry
//! - `jobfit_cache` - Memory, durable and hybrid TTL caches
//! - `jobfit_rate_limit` - Fixed-window rate limiter
//! - `jobfit_retry` - Exponential backoff retry
//!
//! This crate (`jobfit`) adds the orchestrator and re-exports everything for
//! convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod orchestrator;
mod phase;
mod upstream;

pub use jobfit_cache::*;
pub use jobfit_core::*;
pub use jobfit_error::*;
pub use jobfit_rate_limit::*;
pub use jobfit_retry::*;

pub use orchestrator::{Analysis, AnalysisOrchestrator, AnalysisSource};
pub use phase::{PhaseObserver, RequestPhase};
pub use upstream::Upstream;
