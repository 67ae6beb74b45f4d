// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for costscope.
//!
//! This module provides strongly-typed errors for different parts of the crate,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation.

use std::fmt;

use thiserror::Error;

/// Errors raised by the cost engine itself.
///
/// Failures of the work being measured are never wrapped in this type; they
/// pass through `timed` and `Instrumented` calls unchanged.
#[derive(Error, Debug)]
pub enum CostError {
    #[error("Unable to track cost of {surface} because it is not a trait")]
    NotATrait { surface: String },

    #[error("Task failed: {0}")]
    Task(#[from] TaskFailure),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

/// Why a submitted task did not produce a value.
#[derive(Error, Debug)]
pub enum TaskFailure {
    #[error("{0}")]
    Failed(anyhow::Error),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task was dropped before completing")]
    Abandoned,

    #[error("Task was rejected by the provider: {0}")]
    Rejected(String),
}

impl TaskFailure {
    /// Build a failure from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }

    /// The underlying task error, if the task returned one.
    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err)
    }
}

/// One entry of a batch resolution: either a result or the failure that
/// replaced it.
#[derive(Debug)]
pub struct Outcome<T> {
    pub result: Option<T>,
    pub failure: Option<TaskFailure>,
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Self {
            result: Some(value),
            failure: None,
        }
    }

    pub fn failure(failure: TaskFailure) -> Self {
        Self {
            result: None,
            failure: Some(failure),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Aggregate failure of a batch of pending tasks.
///
/// Carries every outcome in the order the tasks were supplied, so callers can
/// inspect the successful results alongside the failures.
#[derive(Debug)]
pub struct FutureListError<T> {
    outcomes: Vec<Outcome<T>>,
}

impl<T> FutureListError<T> {
    pub fn new(outcomes: Vec<Outcome<T>>) -> Self {
        Self { outcomes }
    }

    /// All outcomes, in submission order.
    pub fn outcomes(&self) -> &[Outcome<T>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }

    /// Number of entries that failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Iterate over the failures only.
    pub fn failures(&self) -> impl Iterator<Item = &TaskFailure> {
        self.outcomes.iter().filter_map(|o| o.failure.as_ref())
    }
}

impl<T> fmt::Display for FutureListError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} futures failed",
            self.failed_count(),
            self.outcomes.len()
        )?;
        if let Some(first) = self.failures().next() {
            write!(f, " (first: {})", first)?;
        }
        Ok(())
    }
}

impl<T: fmt::Debug> std::error::Error for FutureListError<T> {}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;
