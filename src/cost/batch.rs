// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Resolving batches of submitted tasks.

use std::future::Future;
use std::panic::Location;

use super::context::CostContext;
use super::provider::{Pending, TaskResult};
use crate::error::{CostError, FutureListError, Outcome};

fn batch_description(location: &Location<'_>) -> String {
    format!("futures {}:{}", location.file(), location.line())
}

/// Fold results, in order, into either every value or an aggregate failure.
fn collect_outcomes<T, I>(results: I) -> Result<Vec<T>, FutureListError<T>>
where
    I: IntoIterator<Item = TaskResult<T>>,
{
    let mut outcomes = Vec::new();
    let mut any_failed = false;

    for result in results {
        match result {
            Ok(value) => outcomes.push(Outcome::success(value)),
            Err(failure) => {
                any_failed = true;
                outcomes.push(Outcome::failure(failure));
            }
        }
    }

    if any_failed {
        return Err(FutureListError::new(outcomes));
    }
    Ok(outcomes.into_iter().filter_map(|o| o.result).collect())
}

async fn await_in_order<T>(pending: Vec<Pending<T>>) -> Result<Vec<T>, FutureListError<T>> {
    let mut results = Vec::with_capacity(pending.len());
    for handle in pending {
        results.push(handle.await);
    }
    collect_outcomes(results)
}

impl CostContext {
    /// Wait for every handle, in the order given.
    ///
    /// Does not stop at the first failure: if any task failed, the error
    /// carries the outcome of every task. The wait itself is timed under
    /// `futures <caller file>:<line>`.
    ///
    /// Safe to call from a multi-thread tokio worker. On a current-thread
    /// runtime each unfinished task is reported as [`TaskFailure::Rejected`];
    /// use [`CostContext::resolve_all_async`] there.
    ///
    /// [`TaskFailure::Rejected`]: crate::error::TaskFailure::Rejected
    #[track_caller]
    pub fn resolve_all<T>(&self, pending: Vec<Pending<T>>) -> Result<Vec<T>, FutureListError<T>> {
        let wait_all = || collect_outcomes(pending.into_iter().map(Pending::wait));

        if !self.is_timing() {
            return wait_all();
        }
        let description = batch_description(Location::caller());
        self.timed(&description, wait_all)
    }

    /// Async counterpart of [`CostContext::resolve_all`].
    #[track_caller]
    pub fn resolve_all_async<'a, T: 'a>(
        &'a self,
        pending: Vec<Pending<T>>,
    ) -> impl Future<Output = Result<Vec<T>, FutureListError<T>>> + 'a {
        let location = Location::caller();
        async move {
            if !self.is_timing() {
                return await_in_order(pending).await;
            }
            let description = batch_description(location);
            self.timed_async(&description, await_in_order(pending)).await
        }
    }

    /// Wait for a single handle.
    pub fn resolve<T>(&self, pending: Pending<T>) -> Result<T, CostError> {
        pending.wait().map_err(CostError::from)
    }
}
