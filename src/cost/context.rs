// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Scope lifecycle, timed calls, and activity propagation.
//!
//! The current activity is never stored in thread-local state. A scope hands
//! its work a [`CostContext`]; everything that should be attributed to the
//! scope receives that context (or a clone of it) explicitly, including tasks
//! submitted to other threads.

use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use super::activity::Activity;
use super::provider::{AsyncProvider, DirectProvider, Pending};
use super::report::CostReport;
use crate::config::{config_from_env, CostConfig};
use crate::error::ConfigError;
use crate::telemetry::CostTimer;

/// Process-wide instance configured from `COSTSCOPE_*` environment variables.
pub static GLOBAL_COSTS: Lazy<Costs> = Lazy::new(|| match config_from_env() {
    Ok(config) => Costs::new(config),
    Err(err) => {
        warn!(error = %err, "Ignoring invalid cost configuration from environment");
        Costs::default()
    }
});

/// Get the process-wide [`Costs`] instance.
pub fn costs() -> &'static Costs {
    &GLOBAL_COSTS
}

/// Entry point for cost tracking: opens scopes according to its configuration.
///
/// Cheap to clone; clones share configuration and switches.
#[derive(Debug, Clone)]
pub struct Costs {
    inner: Arc<CostsInner>,
}

#[derive(Debug)]
struct CostsInner {
    config: CostConfig,
    track_costs: AtomicBool,
    track_detail_costs: AtomicBool,
}

impl Costs {
    pub fn new(config: CostConfig) -> Self {
        Self {
            inner: Arc::new(CostsInner {
                track_costs: AtomicBool::new(config.track_costs),
                track_detail_costs: AtomicBool::new(config.track_detail_costs),
                config,
            }),
        }
    }

    /// Build from defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        config_from_env().map(Self::new)
    }

    /// Current configuration, including any switches flipped at run time.
    pub fn config(&self) -> CostConfig {
        CostConfig {
            track_costs: self.tracks_costs(),
            track_detail_costs: self.tracks_detail_costs(),
            ..self.inner.config.clone()
        }
    }

    pub fn tracks_costs(&self) -> bool {
        self.inner.track_costs.load(Ordering::Relaxed)
    }

    pub fn tracks_detail_costs(&self) -> bool {
        self.inner.track_detail_costs.load(Ordering::Relaxed)
    }

    pub fn set_track_costs(&self, enabled: bool) {
        self.inner.track_costs.store(enabled, Ordering::Relaxed);
    }

    pub fn set_track_detail_costs(&self, enabled: bool) {
        self.inner.track_detail_costs.store(enabled, Ordering::Relaxed);
    }

    pub fn async_enabled(&self) -> bool {
        self.inner.config.async_enabled
    }

    pub fn trace_cost_limit(&self) -> u64 {
        self.inner.config.trace_cost_limit
    }

    /// A context with no activity. Timed calls through it run uninstrumented.
    pub fn detached(&self) -> CostContext {
        CostContext {
            costs: self.clone(),
            activity: None,
            is_async: false,
        }
    }

    /// Run `work` inside a fresh activity and report what it cost.
    pub fn scope<F>(&self, work: F) -> CostReport
    where
        F: FnOnce(&CostContext),
    {
        self.scope_with(work).1
    }

    /// Like [`Costs::scope`], also returning the value produced by `work`.
    ///
    /// With cost tracking disabled, `work` runs against a detached context and
    /// the report is empty.
    pub fn scope_with<R, F>(&self, work: F) -> (R, CostReport)
    where
        F: FnOnce(&CostContext) -> R,
    {
        if !self.tracks_costs() {
            return (work(&self.detached()), CostReport::empty());
        }

        let activity = Arc::new(Activity::new(self.inner.config.bucket_size));
        let ctx = CostContext {
            costs: self.clone(),
            activity: Some(Arc::clone(&activity)),
            is_async: false,
        };

        let value = work(&ctx);
        (value, activity.describe())
    }
}

impl Default for Costs {
    fn default() -> Self {
        Self::new(CostConfig::default())
    }
}

/// Handle to the activity a piece of work is attributed to.
///
/// Clones share the activity. A context passed into a submitted task is
/// marked async so the task can tell it runs on behalf of another thread.
#[derive(Debug, Clone)]
pub struct CostContext {
    costs: Costs,
    activity: Option<Arc<Activity>>,
    is_async: bool,
}

impl CostContext {
    pub fn costs(&self) -> &Costs {
        &self.costs
    }

    pub fn activity(&self) -> Option<&Activity> {
        self.activity.as_deref()
    }

    pub fn has_activity(&self) -> bool {
        self.activity.is_some()
    }

    /// Whether this context was carried into a submitted task.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Whether timed calls through this context currently record anything.
    pub fn is_timing(&self) -> bool {
        self.timing_target().is_some()
    }

    fn timing_target(&self) -> Option<&Activity> {
        if !self.costs.tracks_detail_costs() {
            return None;
        }
        self.activity.as_deref()
    }

    /// Open a nested scope. Its report covers only work done inside `work`;
    /// this context keeps its own activity.
    pub fn scope<F>(&self, work: F) -> CostReport
    where
        F: FnOnce(&CostContext),
    {
        self.costs.scope(work)
    }

    pub fn scope_with<R, F>(&self, work: F) -> (R, CostReport)
    where
        F: FnOnce(&CostContext) -> R,
    {
        self.costs.scope_with(work)
    }

    /// Time `work` and record its cost under `description`.
    ///
    /// The cost is recorded however `work` exits. Its return value, error or
    /// panic passes through unchanged.
    pub fn timed<R, F>(&self, description: &str, work: F) -> R
    where
        F: FnOnce() -> R,
    {
        match self.timing_target() {
            None => work(),
            Some(activity) => {
                let _timer = CostTimer::start(activity, description, self.costs.trace_cost_limit());
                work()
            }
        }
    }

    /// Time `work`, describing it by the caller's source location.
    #[track_caller]
    pub fn timed_here<R, F>(&self, work: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.is_timing() {
            return work();
        }
        let location = Location::caller();
        let description = format!("{}:{}", location.file(), location.line());
        self.timed(&description, work)
    }

    /// Time a future from first poll until it completes or is dropped.
    pub async fn timed_async<F>(&self, description: &str, work: F) -> F::Output
    where
        F: Future,
    {
        match self.timing_target() {
            None => work.await,
            Some(activity) => {
                let _timer = CostTimer::start(activity, description, self.costs.trace_cost_limit());
                work.await
            }
        }
    }

    /// Log a note against the activity without recording cost.
    pub fn note(&self, description: &str) {
        match &self.activity {
            Some(activity) => debug!(activity = %activity.id().short(), description, "note"),
            None => debug!(description, "note"),
        }
    }

    /// Submit `task` to `provider`, carrying this context into it.
    ///
    /// Costs the task records through the context it receives land in this
    /// context's activity, whichever thread the provider runs it on. With
    /// async disabled the task runs inline instead.
    pub fn submit<P, T, F>(&self, provider: &P, task: F) -> Pending<T>
    where
        P: AsyncProvider,
        T: Send + 'static,
        F: FnOnce(&CostContext) -> anyhow::Result<T> + Send + 'static,
    {
        let carried = CostContext {
            costs: self.costs.clone(),
            activity: self.activity.clone(),
            is_async: true,
        };
        let wrapped = move || task(&carried);

        if self.costs.async_enabled() {
            provider.submit(wrapped)
        } else {
            DirectProvider.submit(wrapped)
        }
    }
}
