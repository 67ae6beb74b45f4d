// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Sources are applied with precedence: env > workspace > global > defaults.

use crate::error::ConfigError;

use super::types::{CostConfig, CostConfigFile};

/// Merge all configuration sources into a validated config.
pub fn merge_config(
    global: Option<CostConfigFile>,
    workspace: Option<CostConfigFile>,
    env: Option<CostConfigFile>,
) -> Result<CostConfig, ConfigError> {
    let mut config = CostConfig::default();

    for partial in [global, workspace, env].iter().flatten() {
        config.apply(partial);
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_defaults_only() {
        let config = merge_config(None, None, None).unwrap();
        assert_eq!(config, CostConfig::default());
    }

    #[test]
    fn test_merge_precedence() {
        let global = CostConfigFile {
            bucket_size: Some(10),
            trace_cost_limit: Some(1),
            ..Default::default()
        };
        let workspace = CostConfigFile {
            bucket_size: Some(20),
            ..Default::default()
        };
        let env = CostConfigFile {
            bucket_size: Some(30),
            track_costs: Some(false),
            ..Default::default()
        };

        let config = merge_config(Some(global), Some(workspace), Some(env)).unwrap();
        assert_eq!(config.bucket_size, 30);
        assert_eq!(config.trace_cost_limit, 1);
        assert!(!config.track_costs);
    }

    #[test]
    fn test_merge_validates() {
        let env = CostConfigFile {
            bucket_size: Some(0),
            ..Default::default()
        };
        assert!(merge_config(None, None, Some(env)).is_err());
    }
}
