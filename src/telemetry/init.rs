// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Log subscriber setup for cost output.
//!
//! Timed calls log from `costscope::telemetry::spans`: below the trace cost
//! limit at `trace`, at or above it at `debug`. Verbosity therefore picks
//! which timed calls are visible by picking a level for that one target.

use std::io;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target that timed-call events are logged under.
pub const TIMED_CALL_TARGET: &str = "costscope::telemetry::spans";

/// Which timed calls reach the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CostVerbosity {
    /// No timed calls; warnings and lifecycle messages only.
    #[default]
    Quiet,
    /// Calls at or above the trace cost limit.
    Slow,
    /// Every timed call.
    All,
}

impl CostVerbosity {
    /// `--trace` wins over `--verbose`.
    pub fn from_flags(verbose: bool, trace: bool) -> Self {
        match (verbose, trace) {
            (_, true) => Self::All,
            (true, false) => Self::Slow,
            (false, false) => Self::Quiet,
        }
    }

    /// Filter directive selecting this verbosity.
    pub fn directive(self) -> String {
        match self {
            Self::Quiet => "costscope=info".to_string(),
            Self::Slow => format!("costscope=info,{}=debug", TIMED_CALL_TARGET),
            Self::All => format!("costscope=info,{}=trace", TIMED_CALL_TARGET),
        }
    }
}

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub verbosity: CostVerbosity,
    pub ansi_colors: bool,
    /// Add file and line to each line. Useful with [`CostVerbosity::All`],
    /// where `timed_here` descriptions already carry a location.
    pub show_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbosity: CostVerbosity::Quiet,
            ansi_colors: true,
            show_location: false,
        }
    }
}

impl LogConfig {
    pub fn new(verbosity: CostVerbosity) -> Self {
        Self {
            verbosity,
            show_location: verbosity == CostVerbosity::All,
            ..Self::default()
        }
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi_colors = ansi;
        self
    }

    /// `RUST_LOG` applies only when no verbosity was asked for.
    fn env_filter(&self) -> EnvFilter {
        let chosen = || EnvFilter::new(self.verbosity.directive());
        if self.verbosity == CostVerbosity::Quiet {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| chosen())
        } else {
            chosen()
        }
    }
}

/// Guard returned by [`init_logging`]. Keep it alive for the program's lifetime.
pub struct LogGuard {
    _private: (),
}

/// Install the global log subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> io::Result<LogGuard> {
    let fmt_layer = fmt::layer()
        .compact()
        .with_ansi(config.ansi_colors)
        .with_file(config.show_location)
        .with_line_number(config.show_location);

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    Ok(LogGuard { _private: () })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(CostVerbosity::from_flags(false, false), CostVerbosity::Quiet);
        assert_eq!(CostVerbosity::from_flags(true, false), CostVerbosity::Slow);
        assert_eq!(CostVerbosity::from_flags(true, true), CostVerbosity::All);
        assert_eq!(CostVerbosity::from_flags(false, true), CostVerbosity::All);
    }

    #[test]
    fn test_directives_target_timed_calls() {
        assert_eq!(CostVerbosity::Quiet.directive(), "costscope=info");
        assert_eq!(
            CostVerbosity::Slow.directive(),
            "costscope=info,costscope::telemetry::spans=debug"
        );
        assert_eq!(
            CostVerbosity::All.directive(),
            "costscope=info,costscope::telemetry::spans=trace"
        );
    }

    #[test]
    fn test_every_directive_parses() {
        for verbosity in [CostVerbosity::Quiet, CostVerbosity::Slow, CostVerbosity::All] {
            assert!(EnvFilter::try_new(verbosity.directive()).is_ok());
        }
    }

    #[test]
    fn test_log_config_new() {
        assert!(!LogConfig::new(CostVerbosity::Slow).show_location);
        assert!(LogConfig::new(CostVerbosity::All).show_location);
        assert!(!LogConfig::default().with_ansi(false).ansi_colors);
    }

    #[test]
    fn test_init_logging_twice_fails() {
        let config = LogConfig::default().with_ansi(false);
        // The first call may lose to another test that already installed a subscriber.
        let _first = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
