// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-description cost histogram.
//!
//! A [`CostTracker`] is written by any number of threads at once without
//! locks on the hot path: count, total and max are plain atomics, and the
//! bucket map only takes a shard lock the first time a bucket is seen.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BUCKET_SIZE_MS;

/// Individual fields are read without synchronizing with each other, so a
/// snapshot taken during concurrent writes may be torn across fields.
const ACCESS_ORDERING: Ordering = Ordering::Relaxed;

/// Concurrent, append-only histogram for one named operation.
#[derive(Debug)]
pub struct CostTracker {
    description: String,
    bucket_size: u64,
    count: AtomicU64,
    total: AtomicU64,
    max: AtomicU64,
    buckets: DashMap<u64, AtomicU64>,
}

impl CostTracker {
    /// Create a tracker with the default 1000ms bucket width.
    pub fn new(description: impl Into<String>) -> Self {
        Self::with_bucket_size(description, DEFAULT_BUCKET_SIZE_MS)
    }

    /// Create a tracker with a custom bucket width (ms). A width of zero is
    /// treated as one.
    pub fn with_bucket_size(description: impl Into<String>, bucket_size: u64) -> Self {
        Self {
            description: description.into(),
            bucket_size: bucket_size.max(1),
            count: AtomicU64::new(0),
            total: AtomicU64::new(0),
            max: AtomicU64::new(0),
            buckets: DashMap::new(),
        }
    }

    /// Record one observation.
    pub fn add(&self, elapsed_ms: u64) {
        self.count.fetch_add(1, ACCESS_ORDERING);
        self.total.fetch_add(elapsed_ms, ACCESS_ORDERING);
        self.max.fetch_max(elapsed_ms, ACCESS_ORDERING);
        self.bump_bucket(elapsed_ms / self.bucket_size);
    }

    fn bump_bucket(&self, key: u64) {
        if let Some(bucket) = self.buckets.get(&key) {
            bucket.fetch_add(1, ACCESS_ORDERING);
            return;
        }

        // Two threads may race here; `entry` serializes them on the shard so
        // only one counter is ever created and both increments land on it.
        self.buckets
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, ACCESS_ORDERING);
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bucket_size(&self) -> u64 {
        self.bucket_size
    }

    pub fn count(&self) -> u64 {
        self.count.load(ACCESS_ORDERING)
    }

    pub fn total(&self) -> u64 {
        self.total.load(ACCESS_ORDERING)
    }

    pub fn max(&self) -> u64 {
        self.max.load(ACCESS_ORDERING)
    }

    /// Bucket index to occurrence count, ordered by index.
    pub fn buckets(&self) -> BTreeMap<u64, u64> {
        self.buckets
            .iter()
            .map(|entry| (*entry.key(), entry.value().load(ACCESS_ORDERING)))
            .collect()
    }

    /// Take an immutable copy of the current state.
    pub fn snapshot(&self) -> CostDetail {
        CostDetail {
            description: self.description.clone(),
            bucket_size: self.bucket_size,
            count: self.count(),
            total: self.total(),
            max: self.max(),
            buckets: self.buckets(),
        }
    }
}

/// Immutable view of a [`CostTracker`] at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostDetail {
    pub description: String,
    pub bucket_size: u64,
    pub count: u64,
    /// Sum of observed costs (ms).
    pub total: u64,
    /// Largest observed cost (ms).
    pub max: u64,
    pub buckets: BTreeMap<u64, u64>,
}

impl CostDetail {
    /// Mean cost in ms, or zero when nothing was observed.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }

    /// Approximate percentile (0-100), reported as the upper edge of the
    /// bucket holding the target rank, capped at the observed max.
    pub fn percentile(&self, p: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }

        let target = ((self.count as f64 * p / 100.0).ceil() as u64).max(1);
        let mut cumulative = 0u64;

        for (&index, &occurrences) in &self.buckets {
            cumulative += occurrences;
            if cumulative >= target {
                return (index + 1).saturating_mul(self.bucket_size).min(self.max);
            }
        }

        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_updates_all_fields() {
        let tracker = CostTracker::new("query");
        for x in [5, 1500, 20, 999, 3000] {
            tracker.add(x);
        }

        assert_eq!(tracker.count(), 5);
        assert_eq!(tracker.total(), 5 + 1500 + 20 + 999 + 3000);
        assert_eq!(tracker.max(), 3000);

        let buckets = tracker.buckets();
        assert_eq!(buckets.get(&0), Some(&3));
        assert_eq!(buckets.get(&1), Some(&1));
        assert_eq!(buckets.get(&3), Some(&1));
        assert!(buckets.get(&2).is_none());
        assert_eq!(buckets.values().sum::<u64>(), tracker.count());
    }

    #[test]
    fn test_custom_bucket_size() {
        let tracker = CostTracker::with_bucket_size("io", 10);
        tracker.add(9);
        tracker.add(10);
        tracker.add(25);
        let buckets = tracker.buckets();
        assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_zero_bucket_size_is_clamped() {
        let tracker = CostTracker::with_bucket_size("io", 0);
        tracker.add(3);
        assert_eq!(tracker.bucket_size(), 1);
        assert_eq!(tracker.buckets().get(&3), Some(&1));
    }

    #[test]
    fn test_empty_tracker() {
        let tracker = CostTracker::new("idle");
        assert_eq!(tracker.count(), 0);
        assert_eq!(tracker.max(), 0);
        assert!(tracker.buckets().is_empty());
        assert_eq!(tracker.snapshot().mean(), 0.0);
    }

    #[test]
    fn test_concurrent_adds_match_sequential() {
        let tracker = Arc::new(CostTracker::with_bucket_size("contended", 7));
        let threads = 8;
        let per_thread = 2_000u64;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        tracker.add((i * 13 + t) % 101);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let sequential = CostTracker::with_bucket_size("sequential", 7);
        for t in 0..threads {
            for i in 0..per_thread {
                sequential.add((i * 13 + t) % 101);
            }
        }

        assert_eq!(tracker.count(), threads * per_thread);
        assert_eq!(tracker.total(), sequential.total());
        assert_eq!(tracker.max(), sequential.max());
        assert_eq!(tracker.buckets(), sequential.buckets());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let tracker = CostTracker::new("x");
        tracker.add(10);
        let snapshot = tracker.snapshot();
        tracker.add(20);

        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.max, 10);
        assert_eq!(tracker.count(), 2);
    }

    #[test]
    fn test_mean_and_percentile() {
        let tracker = CostTracker::with_bucket_size("p", 100);
        for _ in 0..9 {
            tracker.add(50);
        }
        tracker.add(450);
        let detail = tracker.snapshot();

        assert!((detail.mean() - 90.0).abs() < f64::EPSILON);
        assert_eq!(detail.percentile(50.0), 100);
        assert_eq!(detail.percentile(99.0), 450);
    }
}
