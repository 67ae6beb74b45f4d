// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! RAII timing of a single call.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cost::Activity;

/// Whole milliseconds elapsed since `start`, saturating.
pub fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// RAII guard for timing one call into an activity.
///
/// The cost is recorded when the guard drops, so it is captured whether the
/// timed work returns normally, returns an error, or unwinds.
pub struct CostTimer<'a> {
    activity: &'a Activity,
    description: &'a str,
    trace_cost_limit: u64,
    start: Instant,
}

impl<'a> CostTimer<'a> {
    /// Start timing. Calls costing at least `trace_cost_limit` ms log at debug level.
    pub fn start(activity: &'a Activity, description: &'a str, trace_cost_limit: u64) -> Self {
        Self {
            activity,
            description,
            trace_cost_limit,
            start: Instant::now(),
        }
    }

    /// Get elapsed time so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for CostTimer<'_> {
    fn drop(&mut self) {
        let cost_ms = elapsed_ms(self.start);
        self.activity.accumulate(self.description, cost_ms);

        if cost_ms < self.trace_cost_limit {
            trace!(
                activity = %self.activity.id().short(),
                cost_ms,
                description = self.description,
                "timed call"
            );
        } else {
            debug!(
                activity = %self.activity.id().short(),
                cost_ms,
                description = self.description,
                "timed call"
            );
        }
    }
}
