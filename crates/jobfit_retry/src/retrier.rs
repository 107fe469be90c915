//! The retry loop.

use crate::{RetryPolicy, Sleeper, TokioSleeper};
use jobfit_error::{AnalysisError, Classify, UpstreamError, classify};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// A successful result and the attempt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    /// Value returned by the operation
    pub value: T,
    /// 1-based attempt number that succeeded
    pub attempts: u32,
}

/// Runs fallible async operations under a [`RetryPolicy`].
///
/// # Timeouts
///
/// The attempt timeout applies to each attempt on its own. An attempt that
/// runs past it is abandoned and counts as a retryable network failure.
///
/// Total duration is unbounded by default. A call may take up to
/// `max_attempts` attempt timeouts plus every backoff delay in between, so a
/// slow upstream that eventually answers is still given its full schedule.
/// Callers that need a hard ceiling set one with
/// [`RetryPolicy::with_overall_timeout`]; an attempt is cut short at that
/// deadline and no retry is scheduled past it.
#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Retrier {
    /// Retry with the tokio timer.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    /// Retry with a custom sleeper.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts.
    ///
    /// # Errors
    ///
    /// Returns the classification of the last failure.
    pub async fn with_retry<F, Fut, T, E>(&self, operation: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        self.run_with_hook(operation, |_, _, _| {})
            .await
            .map(|retried| retried.value)
    }

    /// Like [`with_retry`](Self::with_retry), calling `on_retry(attempt, error, delay)`
    /// before each wait and reporting which attempt succeeded.
    ///
    /// # Errors
    ///
    /// Returns the classification of the last failure.
    #[instrument(skip_all, fields(max_attempts = self.policy.max_attempts()))]
    pub async fn run_with_hook<F, Fut, T, E, H>(
        &self,
        mut operation: F,
        mut on_retry: H,
    ) -> Result<Retried<T>, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
        H: FnMut(u32, &AnalysisError, Duration),
    {
        let deadline = self.policy.overall_timeout().map(|t| Instant::now() + t);
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let error = match self.attempt(&mut operation, deadline).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            if !error.retryable() {
                debug!(attempt, kind = %error.kind(), "Non-retryable error");
                return Err(error);
            }
            if attempt >= max_attempts {
                warn!(attempt, kind = %error.kind(), details = error.details(), "Retries exhausted");
                return Err(error);
            }

            let delay = self.policy.delay_for(attempt);
            if let Some(deadline) = deadline
                && Instant::now() + delay >= deadline
            {
                warn!(attempt, "Overall deadline leaves no time for another attempt");
                return Err(error);
            }

            warn!(
                attempt,
                kind = %error.kind(),
                details = error.details(),
                delay_ms = delay.as_millis() as u64,
                "Attempt failed, retrying"
            );
            on_retry(attempt, &error, delay);
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt<F, Fut, T, E>(
        &self,
        operation: &mut F,
        deadline: Option<Instant>,
    ) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify,
    {
        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        let limit = match (self.policy.attempt_timeout(), remaining) {
            (Some(a), Some(r)) => Some(a.min(r)),
            (a, r) => a.or(r),
        };

        let outcome = match limit {
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let timeout = UpstreamError::Timeout(format!(
                        "attempt timed out after {}ms",
                        limit.as_millis()
                    ));
                    return Err(classify(&timeout));
                }
            },
            None => operation().await,
        };
        outcome.map_err(|e| e.classify())
    }
}

impl Default for Retrier {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

/// Run `operation` under `policy`, sleeping on the tokio timer.
///
/// # Errors
///
/// Returns the classification of the last failure.
pub async fn with_retry<F, Fut, T, E>(operation: F, policy: &RetryPolicy) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    Retrier::new(policy.clone()).with_retry(operation).await
}
