// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and correlation infrastructure.
//!
//! - **Logging**: `tracing` subscriber setup with `EnvFilter`
//! - **Activity ids**: correlate log lines from every worker taking part in one activity
//! - **Timers**: RAII guards that record a call's cost into an activity
//!
//! # Usage
//!
//! ```rust,ignore
//! use costscope::telemetry::{init_logging, CostVerbosity, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::new(CostVerbosity::Slow))?;
//! ```
//!
//! Timed calls below the configured trace cost limit log at `trace`, the rest
//! at `debug`, so [`CostVerbosity::Slow`] shows only the expensive ones.

mod correlation;
mod init;
mod spans;

pub use correlation::{ActivityId, ShortActivityId};
pub use init::{init_logging, CostVerbosity, LogConfig, LogGuard, TIMED_CALL_TARGET};
pub use spans::{elapsed_ms, CostTimer};
