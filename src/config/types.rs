// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of file-level and resolved configuration,
//! supporting JSON and YAML formats.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default histogram bucket width in milliseconds.
pub const DEFAULT_BUCKET_SIZE_MS: u64 = 1000;

/// Default threshold at which timed-call logs move from trace to debug.
pub const DEFAULT_TRACE_COST_LIMIT_MS: u64 = 10 * 1000;

/// Partial configuration as read from a file or the environment.
/// Unset fields fall through to the next source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostConfigFile {
    /// Width of a histogram bucket (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_size: Option<u64>,

    /// Whether submissions go to the supplied provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_enabled: Option<bool>,

    /// Timed calls at or above this cost (ms) log at debug instead of trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_cost_limit: Option<u64>,

    /// Master switch for scopes and reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_costs: Option<bool>,

    /// Switch for per-call timing and instrumentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_detail_costs: Option<bool>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostConfig {
    pub bucket_size: u64,
    pub async_enabled: bool,
    pub trace_cost_limit: u64,
    pub track_costs: bool,
    pub track_detail_costs: bool,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            bucket_size: DEFAULT_BUCKET_SIZE_MS,
            async_enabled: true,
            trace_cost_limit: DEFAULT_TRACE_COST_LIMIT_MS,
            track_costs: true,
            track_detail_costs: true,
        }
    }
}

impl CostConfig {
    /// Configuration with every tracking switch off.
    pub fn disabled() -> Self {
        Self {
            track_costs: false,
            track_detail_costs: false,
            ..Self::default()
        }
    }

    pub fn with_bucket_size(mut self, bucket_size: u64) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub fn with_async(mut self, enabled: bool) -> Self {
        self.async_enabled = enabled;
        self
    }

    pub fn with_trace_cost_limit(mut self, limit: u64) -> Self {
        self.trace_cost_limit = limit;
        self
    }

    pub fn with_track_costs(mut self, enabled: bool) -> Self {
        self.track_costs = enabled;
        self
    }

    pub fn with_track_detail_costs(mut self, enabled: bool) -> Self {
        self.track_detail_costs = enabled;
        self
    }

    /// Apply the set fields of a partial config on top of this one.
    pub fn apply(&mut self, partial: &CostConfigFile) {
        if let Some(v) = partial.bucket_size {
            self.bucket_size = v;
        }
        if let Some(v) = partial.async_enabled {
            self.async_enabled = v;
        }
        if let Some(v) = partial.trace_cost_limit {
            self.trace_cost_limit = v;
        }
        if let Some(v) = partial.track_costs {
            self.track_costs = v;
        }
        if let Some(v) = partial.track_detail_costs {
            self.track_detail_costs = v;
        }
    }

    /// Check invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_size == 0 {
            return Err(ConfigError::invalid("bucketSize", "must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CostConfig::default();
        assert_eq!(config.bucket_size, 1000);
        assert_eq!(config.trace_cost_limit, 10_000);
        assert!(config.async_enabled);
        assert!(config.track_costs);
        assert!(config.track_detail_costs);
    }

    #[test]
    fn test_apply_partial() {
        let mut config = CostConfig::default();
        config.apply(&CostConfigFile {
            bucket_size: Some(250),
            track_detail_costs: Some(false),
            ..Default::default()
        });
        assert_eq!(config.bucket_size, 250);
        assert!(!config.track_detail_costs);
        assert!(config.track_costs);
    }

    #[test]
    fn test_validate_rejects_zero_bucket() {
        let config = CostConfig::default().with_bucket_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "bucketSize"
        ));
    }

    #[test]
    fn test_partial_serde_camel_case() {
        let partial: CostConfigFile =
            serde_json::from_str(r#"{"traceCostLimit": 5, "asyncEnabled": false}"#).unwrap();
        assert_eq!(partial.trace_cost_limit, Some(5));
        assert_eq!(partial.async_enabled, Some(false));
        assert!(partial.bucket_size.is_none());

        let json = serde_json::to_string(&partial).unwrap();
        assert!(!json.contains("bucketSize"));
    }
}
