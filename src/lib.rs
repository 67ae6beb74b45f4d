// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! costscope - in-process cost and latency instrumentation.
//!
//! Measures the wall-clock cost of named operations, aggregates it into
//! per-description histograms, and correlates work that fans out across
//! worker threads into a single activity.
//!
//! # Architecture
//!
//! - [`cost`] - Scopes, timed calls, instrumentation wrappers, task submission and batching
//! - [`config`] - Configuration loading and merging (files, environment)
//! - [`telemetry`] - Log subscriber setup, activity ids and call timers
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```rust,ignore
//! use costscope::cost::{Costs, ThreadProvider};
//!
//! let costs = Costs::default();
//! let provider = ThreadProvider::default();
//! let report = costs.scope(|ctx| {
//!     ctx.timed("parse", || parse(input));
//!     let pending = ctx.submit(&provider, |ctx| Ok(ctx.timed("index", || index(doc))));
//!     ctx.resolve(pending).ok();
//! });
//! println!("{}", report.format_report());
//! ```

pub mod config;
pub mod cost;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::CostConfig;
pub use cost::{
    costs, AsyncProvider, Call, CostContext, CostDetail, CostReport, CostTracker, Costs,
    Instrumented, Pending, Surface,
};
pub use error::{ConfigError, CostError, FutureListError, Outcome, Result, TaskFailure};

/// costscope version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
