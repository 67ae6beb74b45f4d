// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Shared accumulation context for one logical unit of work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::report::CostReport;
use super::tracker::CostTracker;
use crate::telemetry::{elapsed_ms, ActivityId};

/// Accumulates costs from every thread working on behalf of one scope.
///
/// Trackers live in a sharded concurrent map, so threads recording different
/// descriptions rarely contend with each other.
#[derive(Debug)]
pub struct Activity {
    id: ActivityId,
    start: Instant,
    started_at: DateTime<Utc>,
    bucket_size: u64,
    costs: DashMap<String, CostTracker>,
    total_cost: AtomicU64,
}

impl Activity {
    /// Start a new activity whose trackers use `bucket_size` ms buckets.
    pub fn new(bucket_size: u64) -> Self {
        Self {
            id: ActivityId::generate(),
            start: Instant::now(),
            started_at: Utc::now(),
            bucket_size,
            costs: DashMap::new(),
            total_cost: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Sum of every accumulated cost (ms).
    pub fn total_cost(&self) -> u64 {
        self.total_cost.load(Ordering::Relaxed)
    }

    /// Number of distinct descriptions seen so far.
    pub fn description_count(&self) -> usize {
        self.costs.len()
    }

    /// Record `elapsed_ms` against `description`.
    pub fn accumulate(&self, description: &str, elapsed_ms: u64) {
        self.tracker_add(description, elapsed_ms);
        self.total_cost.fetch_add(elapsed_ms, Ordering::Relaxed);
    }

    fn tracker_add(&self, description: &str, elapsed_ms: u64) {
        if let Some(tracker) = self.costs.get(description) {
            tracker.add(elapsed_ms);
            return;
        }

        self.costs
            .entry(description.to_string())
            .or_insert_with(|| CostTracker::with_bucket_size(description, self.bucket_size))
            .add(elapsed_ms);
    }

    /// Snapshot the activity.
    ///
    /// Safe to call while other threads are still accumulating; the result is
    /// a point-in-time view, not a consistent cut.
    pub fn describe(&self) -> CostReport {
        let cost = elapsed_ms(self.start);
        let details = self
            .costs
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();

        CostReport::new(cost, details, Some(self.id), Some(self.started_at))
    }
}
