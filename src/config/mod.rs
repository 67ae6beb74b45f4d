// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for costscope.
//!
//! Handles loading and merging of configuration from multiple sources:
//! - Global config: ~/.costscope/config.json
//! - Workspace config: .costscope.json, .costscope.yaml, or costscope.config.json
//! - Environment: `COSTSCOPE_*` variables
//!
//! Configuration is merged with precedence (env > workspace > global > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    get_global_config_path, load_config_file, load_env_overrides, load_global_config,
    load_workspace_config, overrides_from_vars, CONFIG_FILES, ENV_PREFIX, GLOBAL_CONFIG_DIR,
    GLOBAL_CONFIG_FILE,
};

pub use merger::merge_config;

pub use types::{CostConfig, CostConfigFile, DEFAULT_BUCKET_SIZE_MS, DEFAULT_TRACE_COST_LIMIT_MS};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a directory.
///
/// This is the main entry point for configuration loading.
pub fn load_config(dir: &Path) -> Result<CostConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(dir)?;
    let env = load_env_overrides()?;

    merge_config(global, workspace, Some(env))
}

/// Configuration from defaults and the environment only.
pub fn config_from_env() -> Result<CostConfig, ConfigError> {
    merge_config(None, None, Some(load_env_overrides()?))
}
