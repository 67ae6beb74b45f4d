// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cost tracking: scopes, timed calls, instrumentation and batching.
//!
//! The unit of cost is a millisecond. A scope opens an [`Activity`] and hands
//! its work a [`CostContext`]; timed calls, [`Instrumented`] wrappers and
//! submitted tasks all accumulate into that activity, even when they run on
//! other threads. Closing the scope yields a [`CostReport`].
//!
//! ```rust,ignore
//! use costscope::cost::{costs, ThreadProvider};
//!
//! let provider = ThreadProvider::default();
//! let report = costs().scope(|ctx| {
//!     let users = ctx.submit(&provider, |ctx| Ok(ctx.timed("load users", load_users)));
//!     let orders = ctx.submit(&provider, |ctx| Ok(ctx.timed("load orders", load_orders)));
//!     ctx.resolve_all(vec![users, orders]).ok();
//! });
//! println!("{}", report.format_report());
//! ```

mod activity;
mod batch;
mod context;
mod instrument;
mod provider;
mod report;
mod tracker;

pub use activity::Activity;
pub use context::{costs, CostContext, Costs, GLOBAL_COSTS};
pub use instrument::{Arg, Call, Instrumented, Surface, SurfaceKind, SQL_DESCRIPTION_LEN};
pub use provider::{
    run_task, AsyncProvider, Completion, DirectProvider, Pending, TaskResult, ThreadProvider,
    TokioProvider,
};
pub use report::{sort_details, CostReport};
pub use tracker::{CostDetail, CostTracker};
