//! Tests for the retry loop.

use jobfit_core::RetryConfig;
use jobfit_error::{AnalysisErrorKind, UpstreamError};
use jobfit_retry::{Retrier, RetryPolicy, Sleeper, with_retry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records requested delays without waiting.
#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn retrier(max_attempts: u32) -> (Retrier, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let policy = RetryPolicy::new(
        max_attempts,
        Duration::from_millis(1_000),
        2.0,
        Duration::from_millis(10_000),
    );
    (Retrier::with_sleeper(policy, sleeper.clone()), sleeper)
}

#[tokio::test]
async fn test_network_failures_then_success() {
    let (retrier, sleeper) = retrier(3);
    let calls = AtomicU32::new(0);

    let result = retrier
        .with_retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= 2 {
                Err(UpstreamError::Connection("connection reset".into()))
            } else {
                Ok(82)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 82);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(1_000), Duration::from_millis(2_000)]
    );
}

#[tokio::test]
async fn test_non_retryable_error_stops_immediately() {
    let (retrier, sleeper) = retrier(5);
    let calls = AtomicU32::new(0);

    let err = retrier
        .with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(UpstreamError::status(401, "bad token"))
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::Auth);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_exhaustion_returns_last_classified_error() {
    let (retrier, sleeper) = retrier(3);
    let calls = AtomicU32::new(0);

    let err = retrier
        .with_retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err::<(), _>(UpstreamError::Connection("refused".into()))
            } else {
                Err(UpstreamError::status(503, "overloaded"))
            }
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::Server);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.delays().len(), 2);
}

#[tokio::test]
async fn test_single_attempt_policy_never_sleeps() {
    let (retrier, sleeper) = retrier(1);
    let err = retrier
        .with_retry(|| async { Err::<(), _>(UpstreamError::message("network down")) })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::Network);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_delays_are_capped() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let policy = RetryPolicy::new(6, Duration::from_secs(1), 3.0, Duration::from_secs(5));
    let retrier = Retrier::with_sleeper(policy, sleeper.clone());

    let _ = retrier
        .with_retry(|| async { Err::<(), _>(UpstreamError::status(500, "boom")) })
        .await;

    let secs: Vec<u64> = sleeper.delays().iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![1, 3, 5, 5, 5]);
}

#[tokio::test]
async fn test_hook_sees_each_retry() {
    let (retrier, _sleeper) = retrier(3);
    let calls = AtomicU32::new(0);
    let mut seen = Vec::new();

    let retried = retrier
        .run_with_hook(
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 1 { Err(UpstreamError::message("timeout")) } else { Ok("done") }
            },
            |attempt, error, delay| seen.push((attempt, error.kind(), delay)),
        )
        .await
        .unwrap();

    assert_eq!(retried.value, "done");
    assert_eq!(retried.attempts, 2);
    assert_eq!(
        seen,
        vec![(1, AnalysisErrorKind::Network, Duration::from_millis(1_000))]
    );
}

#[tokio::test(start_paused = true)]
async fn test_attempt_timeout_is_a_network_error() {
    let policy = RetryPolicy::new(2, Duration::from_millis(10), 2.0, Duration::from_millis(10))
        .with_attempt_timeout(Some(Duration::from_secs(1)));
    let calls = AtomicU32::new(0);

    let result = with_retry(
        || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok::<_, UpstreamError>(n)
        },
        &policy,
    )
    .await;

    assert_eq!(result.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_default_policy_bounds_attempts_not_the_call() {
    let policy = RetryPolicy::from(&RetryConfig::default()).with_jitter(0.0);
    assert_eq!(policy.attempt_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(policy.overall_timeout(), None);
    let started = tokio::time::Instant::now();

    let err = with_retry(
        || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, UpstreamError>(())
        },
        &policy,
    )
    .await
    .unwrap_err();

    // Three 30s attempts plus the 1s and 2s delays between them
    assert_eq!(err.kind(), AnalysisErrorKind::Network);
    assert!(started.elapsed() >= Duration::from_secs(93));
}

#[tokio::test(start_paused = true)]
async fn test_overall_deadline_bounds_the_call() {
    let policy = RetryPolicy::new(10, Duration::from_secs(1), 1.0, Duration::from_secs(1))
        .with_overall_timeout(Some(Duration::from_millis(2_500)));
    let calls = AtomicU32::new(0);
    let started = tokio::time::Instant::now();

    let err = with_retry(
        || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(UpstreamError::status(502, "bad gateway"))
        },
        &policy,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), AnalysisErrorKind::Server);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() < Duration::from_millis(2_500));
}

#[tokio::test]
async fn test_string_errors_are_classified() {
    let (retrier, _sleeper) = retrier(2);
    let err = retrier
        .with_retry(|| async { Err::<(), _>(String::from("field resume is required")) })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AnalysisErrorKind::Validation);
}
