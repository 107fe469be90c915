//! The request pipeline.

use crate::{PhaseObserver, RequestPhase, Upstream};
use derive_getters::Getters;
use jobfit_cache::{CacheLayer, FileKv, HybridCache, KvBackend, MemoryKv};
use jobfit_core::{
    AnalysisRequest, AnalysisResult, CacheKey, JobfitConfig, SharedClock, SystemClock,
};
use jobfit_error::{AnalysisError, AnalysisErrorKind, JobfitResult};
use jobfit_rate_limit::{Dimension, RateLimiter};
use jobfit_retry::{Retrier, RetryPolicy};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where an analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AnalysisSource {
    /// Served from the cache; no upstream call and no rate-limit charge
    Cache,
    /// Produced by the upstream model
    Upstream,
}

/// A completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    result: AnalysisResult,
    source: AnalysisSource,
    /// Upstream attempts made; zero for cache hits
    attempts: u32,
}

impl Analysis {
    /// Take the payload.
    pub fn into_result(self) -> AnalysisResult {
        self.result
    }
}

fn silent(_: RequestPhase) {}

/// Runs analysis requests through validation, cache, rate limiting and retry.
///
/// The orchestrator holds shared references to its stores and no mutable state
/// of its own, so one instance serves any number of concurrent requests.
///
/// The upstream call and the cache write run on a spawned task. A caller that
/// gives up waiting does not cancel the call, and a late success still fills
/// the cache.
#[derive(Debug, Clone)]
pub struct AnalysisOrchestrator {
    cache: Arc<HybridCache>,
    limiter: Arc<RateLimiter>,
    retrier: Retrier,
    upstream: Arc<dyn Upstream>,
}

impl AnalysisOrchestrator {
    /// Assemble from existing parts.
    pub fn new(
        cache: Arc<HybridCache>,
        limiter: Arc<RateLimiter>,
        retrier: Retrier,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            cache,
            limiter,
            retrier,
            upstream,
        }
    }

    /// Build every store from configuration and start their sweepers.
    ///
    /// The durable cache layer uses files under `cache.durable_path` when set and
    /// process memory otherwise. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache directory
    /// cannot be created.
    #[instrument(skip_all)]
    pub fn from_config(config: &JobfitConfig, upstream: Arc<dyn Upstream>) -> JobfitResult<Self> {
        Self::from_config_with_clock(config, upstream, Arc::new(SystemClock))
    }

    /// Like [`from_config`](Self::from_config) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the cache directory
    /// cannot be created.
    pub fn from_config_with_clock(
        config: &JobfitConfig,
        upstream: Arc<dyn Upstream>,
        clock: SharedClock,
    ) -> JobfitResult<Self> {
        config.validate()?;

        let backend: Arc<dyn KvBackend> = match config.cache().durable_path() {
            Some(path) => {
                info!(path = %path.display(), "Using file-backed durable cache");
                Arc::new(FileKv::new(path)?)
            }
            None => {
                debug!("Using in-memory durable cache");
                Arc::new(MemoryKv::new())
            }
        };

        let cache = HybridCache::spawn(config.cache(), backend, clock.clone());
        let limiter = RateLimiter::spawn(config.rate_limit().clone(), clock);
        let retrier = Retrier::new(RetryPolicy::from(config.retry()));
        Ok(Self::new(cache, limiter, retrier, upstream))
    }

    /// The cache shared by all requests.
    pub fn cache(&self) -> &Arc<HybridCache> {
        &self.cache
    }

    /// The rate limiter shared by all requests.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run one request.
    ///
    /// # Errors
    ///
    /// Returns a classified [`AnalysisError`]: `validation` for incomplete requests,
    /// `rateLimited` with a reset time when a limit is hit, or the last upstream
    /// failure once retries are exhausted.
    pub async fn generate(&self, request: AnalysisRequest) -> Result<Analysis, AnalysisError> {
        self.generate_observed(request, Arc::new(silent)).await
    }

    /// Run one request, reporting each phase to `observer`.
    ///
    /// # Errors
    ///
    /// Same as [`generate`](Self::generate).
    #[instrument(
        skip_all,
        fields(
            identity = %request.identity(),
            resource = %request.resource_id(),
            operation = %request.operation(),
        )
    )]
    pub async fn generate_observed(
        &self,
        request: AnalysisRequest,
        observer: Arc<dyn PhaseObserver>,
    ) -> Result<Analysis, AnalysisError> {
        observer.on_phase(RequestPhase::Idle);
        let outcome = self.run(request, observer.clone()).await;
        match &outcome {
            Ok(analysis) => {
                info!(source = %analysis.source(), attempts = analysis.attempts(), "Analysis complete");
                observer.on_phase(RequestPhase::Success);
            }
            Err(error) => {
                warn!(kind = %error.kind(), details = error.details(), "Analysis failed");
                observer.on_phase(RequestPhase::Error);
            }
        }
        outcome
    }

    async fn run(
        &self,
        request: AnalysisRequest,
        observer: Arc<dyn PhaseObserver>,
    ) -> Result<Analysis, AnalysisError> {
        observer.on_phase(RequestPhase::Validating);
        request.validate()?;

        observer.on_phase(RequestPhase::CacheCheck);
        let key = request.cache_key();
        if let Some(result) = self.cache.get(&key).await {
            debug!(key = %key, "Serving analysis from cache");
            return Ok(Analysis {
                result,
                source: AnalysisSource::Cache,
                attempts: 0,
            });
        }

        observer.on_phase(RequestPhase::RateLimiting);
        let checks = [
            (Dimension::Burst, request.identity().as_str()),
            (Dimension::PerUser, request.identity().as_str()),
            (Dimension::PerIp, request.client_ip().as_str()),
        ];
        if let Err(rejected) = self.limiter.check_all(&checks).await {
            debug!(dimension = %rejected.dimension(), "Request rate limited");
            return Err(rejected.to_error().unwrap_or_else(|| {
                AnalysisError::rate_limited(rejected.reset_at(), 1)
            }));
        }

        observer.on_phase(RequestPhase::Calling);
        self.call_upstream(request, key, observer).await
    }

    async fn call_upstream(
        &self,
        request: AnalysisRequest,
        key: CacheKey,
        observer: Arc<dyn PhaseObserver>,
    ) -> Result<Analysis, AnalysisError> {
        let cache = self.cache.clone();
        let upstream = self.upstream.clone();
        let retrier = self.retrier.clone();

        let task = tokio::spawn(async move {
            let retried = retrier
                .run_with_hook(
                    || upstream.analyze(&request),
                    |attempt, _, _| {
                        observer.on_phase(RequestPhase::Retrying {
                            attempt: attempt + 1,
                        })
                    },
                )
                .await?;
            cache.set(&key, retried.value.clone()).await;
            Ok::<_, AnalysisError>(Analysis {
                result: retried.value,
                source: AnalysisSource::Upstream,
                attempts: retried.attempts,
            })
        });

        task.await.unwrap_or_else(|e| {
            Err(AnalysisError::new(AnalysisErrorKind::Unknown)
                .with_details(format!("upstream task failed: {}", e)))
        })
    }

    /// Drop a cached analysis so the next request recomputes it.
    ///
    /// Returns whether any layer held the key.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.cache.delete(key).await;
        info!(removed, "Invalidated cached analysis");
        removed
    }

    /// Stop background sweepers.
    pub async fn shutdown(&self) {
        self.cache.shutdown().await;
        self.limiter.shutdown().await;
    }
}
