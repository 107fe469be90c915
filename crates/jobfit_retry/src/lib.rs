//! Retry with exponential backoff for upstream analysis calls.
//!
//! Every failure is classified into an [`AnalysisError`](jobfit_error::AnalysisError)
//! and only retryable kinds (network, server, rate limited) are attempted again.
//! When attempts run out the last classified error is returned as is.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can record delays
//! instead of waiting for them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod policy;
mod retrier;
mod sleeper;

pub use policy::RetryPolicy;
pub use retrier::{Retried, Retrier, with_retry};
pub use sleeper::{Sleeper, TokioSleeper};
