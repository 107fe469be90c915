//! Periodic background sweeps.
//!
//! Cache and rate-limit stores bound their memory with a sweep that runs on its own
//! tokio task, independent of request traffic. The task stops when its
//! [`SweepHandle`] is stopped or dropped, or when the tick function reports that
//! its target is gone.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Handle to a running sweep task.
#[derive(Debug)]
pub struct SweepHandle {
    name: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Name given at spawn time.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Stop the task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(name = self.name, error = %e, "Sweep task ended abnormally");
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawn a task that calls `tick` every `interval`.
///
/// The first sweep happens one full interval after spawning. `tick` returns
/// `false` to end the task, typically because a weak reference to the store no
/// longer upgrades. Must be called from within a tokio runtime.
pub fn spawn_sweeper<F, Fut>(name: &'static str, interval: Duration, mut tick: F) -> SweepHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    let (tx, mut rx) = oneshot::channel::<()>();
    let period = interval.max(Duration::from_millis(1));

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(name, period_ms = period.as_millis() as u64, "Sweep task started");

        loop {
            tokio::select! {
                _ = &mut rx => {
                    debug!(name, "Sweep task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if !tick().await {
                        debug!(name, "Sweep target dropped, ending task");
                        break;
                    }
                }
            }
        }
    });

    SweepHandle {
        name,
        shutdown: Some(tx),
        task: Some(task),
    }
}
