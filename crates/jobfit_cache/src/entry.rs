//! Cache entries and the age-ordered eviction rules shared by both layers.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use jobfit_core::{AnalysisResult, CacheKey};
use jobfit_error::{JobfitResult, JsonError};
use serde::{Deserialize, Serialize};

/// Fraction of capacity above which a sweep also evicts by age.
pub const SWEEP_HIGH_WATER: f64 = 0.8;

/// Fraction of entries evicted by a sweep that ends above the high-water mark.
pub const SWEEP_EVICT_FRACTION: f64 = 0.2;

/// Cached analysis with its expiration.
///
/// `expires_at == created_at + ttl` at write time. `seq` orders entries written
/// within the same millisecond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CacheEntry {
    key: CacheKey,
    value: AnalysisResult,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    seq: u64,
}

impl CacheEntry {
    pub(crate) fn new(
        key: CacheKey,
        value: AnalysisResult,
        created_at: DateTime<Utc>,
        ttl: chrono::Duration,
        seq: u64,
    ) -> Self {
        Self {
            key,
            value,
            created_at,
            expires_at: created_at + ttl,
            seq,
        }
    }

    /// Whether the entry is logically absent at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Time left before expiry, if any.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let left = self.expires_at - now;
        (left >= chrono::Duration::zero()).then_some(left)
    }

    pub(crate) fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    pub(crate) fn age_order(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }

    pub(crate) fn into_value(self) -> AnalysisResult {
        self.value
    }

    /// Encode as the durable JSON document stored under `storage_key`.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] if the payload cannot be serialized.
    pub fn to_document(&self, storage_key: &str) -> JobfitResult<String> {
        serde_json::to_string(self).map_err(|e| JsonError::encode(storage_key, e.to_string()).into())
    }

    /// Decode the durable JSON document stored under `storage_key`.
    ///
    /// # Errors
    ///
    /// Returns a [`JsonError`] if the document is not a cache entry.
    pub fn from_document(storage_key: &str, document: &str) -> JobfitResult<Self> {
        serde_json::from_str(document)
            .map_err(|e| JsonError::decode(storage_key, e.to_string()).into())
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct SweepReport {
    expired: usize,
    evicted: usize,
    remaining: usize,
}

impl SweepReport {
    pub(crate) fn new(expired: usize, evicted: usize, remaining: usize) -> Self {
        Self {
            expired,
            evicted,
            remaining,
        }
    }

    /// Combine reports from several layers.
    pub fn merge(self, other: SweepReport) -> SweepReport {
        SweepReport {
            expired: self.expired + other.expired,
            evicted: self.evicted + other.evicted,
            remaining: self.remaining + other.remaining,
        }
    }
}

/// Number of oldest entries a sweep should evict, given what survived expiry.
pub(crate) fn sweep_eviction_count(remaining: usize, max_entries: usize) -> usize {
    if (remaining as f64) <= (max_entries as f64) * SWEEP_HIGH_WATER {
        return 0;
    }
    ((remaining as f64) * SWEEP_EVICT_FRACTION).ceil().max(1.0) as usize
}

/// Keys of the `count` oldest entries, oldest first.
pub(crate) fn oldest_keys<'a>(
    entries: impl Iterator<Item = &'a CacheEntry>,
    count: usize,
) -> Vec<CacheKey> {
    let mut ordered: Vec<&CacheEntry> = entries.collect();
    ordered.sort_by_key(|e| e.age_order());
    ordered
        .into_iter()
        .take(count)
        .map(|e| e.key.clone())
        .collect()
}
