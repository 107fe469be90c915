//! The fixed-window rate limiter.

use crate::{Dimension, RateDecision, RateWindow};
use jobfit_core::{RateLimitConfig, SharedClock, SweepHandle, spawn_sweeper, to_chrono};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

type WindowKey = (Dimension, String);

/// Fixed-window counters for every dimension and identity.
///
/// All windows live behind one mutex; each check is a single lock acquisition,
/// so concurrent checks for the same identity never admit more than the limit.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<WindowKey, RateWindow>>,
    config: RateLimitConfig,
    clock: SharedClock,
    sweeper: Mutex<Option<SweepHandle>>,
}

impl RateLimiter {
    /// Create a limiter. No background sweep is started.
    pub fn new(config: RateLimitConfig, clock: SharedClock) -> Self {
        debug!(
            per_user_limit = config.per_user_limit(),
            per_ip_limit = config.per_ip_limit(),
            burst_limit = config.burst_limit(),
            "Creating rate limiter"
        );
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// Create a limiter that sweeps expired windows every
    /// `config.sweep_interval_ms`.
    ///
    /// The sweep task holds a weak reference and ends with the limiter or on
    /// [`shutdown`](Self::shutdown). Must be called within a tokio runtime.
    pub fn spawn(config: RateLimitConfig, clock: SharedClock) -> Arc<Self> {
        let interval = config.sweep_interval();
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let handle = sweep_weak(weak.clone(), interval);
            let mut limiter = Self::new(config, clock);
            limiter.sweeper = Mutex::new(Some(handle));
            limiter
        })
    }

    /// Stop the background sweep, if any.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.stop().await;
            debug!("Rate limiter sweeper stopped");
        }
    }

    /// Policy in effect.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request against one dimension.
    ///
    /// A missing or expired window is replaced by a fresh one starting now. A
    /// window at its limit rejects without counting the request.
    #[instrument(skip(self), fields(dimension = %dimension))]
    pub async fn check(&self, dimension: Dimension, identity: &str) -> RateDecision {
        let now = self.clock.now();
        let limit = dimension.limit(&self.config);
        let length = to_chrono(dimension.window(&self.config));

        let mut windows = self.windows.lock().await;
        let window = windows
            .entry((dimension, identity.to_string()))
            .or_insert_with(|| RateWindow::fresh(now, length));
        if window.is_expired_at(now) {
            *window = RateWindow::fresh(now, length);
        }

        if *window.count() >= limit {
            let decision = RateDecision::reject(dimension, window, now);
            debug!(
                count = window.count(),
                limit,
                retry_after_secs = decision.retry_after_secs(),
                "Rate limit exceeded"
            );
            return decision;
        }

        window.increment();
        let decision = RateDecision::allow(dimension, limit, window);
        debug!(remaining = decision.remaining(), "Rate limit check passed");
        decision
    }

    /// Check several dimensions as one request.
    ///
    /// All windows are inspected under a single lock. If any dimension is at
    /// its limit, the first such rejection is returned and no dimension is
    /// counted. Otherwise every dimension is counted and its decision returned.
    #[instrument(skip(self, checks), fields(dimensions = checks.len()))]
    pub async fn check_all(
        &self,
        checks: &[(Dimension, &str)],
    ) -> Result<Vec<RateDecision>, RateDecision> {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;

        for (dimension, identity) in checks {
            let limit = dimension.limit(&self.config);
            let length = to_chrono(dimension.window(&self.config));
            let window = windows
                .entry((*dimension, identity.to_string()))
                .or_insert_with(|| RateWindow::fresh(now, length));
            if window.is_expired_at(now) {
                *window = RateWindow::fresh(now, length);
            }
            if *window.count() >= limit {
                let decision = RateDecision::reject(*dimension, window, now);
                debug!(
                    dimension = %dimension,
                    count = window.count(),
                    limit,
                    retry_after_secs = decision.retry_after_secs(),
                    "Rate limit exceeded, no dimension counted"
                );
                return Err(decision);
            }
        }

        let decisions: Vec<_> = checks
            .iter()
            .map(|(dimension, identity)| {
                let limit = dimension.limit(&self.config);
                let length = to_chrono(dimension.window(&self.config));
                let window = windows
                    .entry((*dimension, identity.to_string()))
                    .or_insert_with(|| RateWindow::fresh(now, length));
                window.increment();
                RateDecision::allow(*dimension, limit, window)
            })
            .collect();
        debug!("Rate limit checks passed");
        Ok(decisions)
    }

    /// Current window for an identity without counting a request.
    pub async fn status(&self, dimension: Dimension, identity: &str) -> Option<RateWindow> {
        let now = self.clock.now();
        self.windows
            .lock()
            .await
            .get(&(dimension, identity.to_string()))
            .filter(|w| !w.is_expired_at(now))
            .copied()
    }

    /// Drop an identity's window so its next request starts fresh.
    #[instrument(skip(self), fields(dimension = %dimension))]
    pub async fn reset(&self, dimension: Dimension, identity: &str) -> bool {
        let removed = self
            .windows
            .lock()
            .await
            .remove(&(dimension, identity.to_string()))
            .is_some();
        info!(removed, "Reset rate limit window");
        removed
    }

    /// Remove every window whose reset time has passed. Returns how many went.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| *w.reset_at() >= now);
        let removed = before - windows.len();
        if removed > 0 {
            info!(removed, remaining = windows.len(), "Swept rate limit windows");
        }
        removed
    }

    /// Number of tracked windows, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Whether no windows are tracked.
    pub async fn is_empty(&self) -> bool {
        self.windows.lock().await.is_empty()
    }
}

fn sweep_weak(weak: Weak<RateLimiter>, interval: Duration) -> SweepHandle {
    spawn_sweeper("rate_limiter", interval, move || {
        let weak = weak.clone();
        async move {
            match weak.upgrade() {
                Some(limiter) => {
                    limiter.sweep().await;
                    true
                }
                None => false,
            }
        }
    })
}
