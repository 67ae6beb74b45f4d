// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files and the environment.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::CostConfigFile;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".costscope.json", ".costscope.yaml", "costscope.config.json"];

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".costscope";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "COSTSCOPE_";

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.costscope/config.json.
pub fn load_global_config() -> Result<Option<CostConfigFile>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_file(&path).map(Some)
}

/// Load configuration from a directory.
///
/// Searches for config files in the following order:
/// 1. .costscope.json
/// 2. .costscope.yaml
/// 3. costscope.config.json
pub fn load_workspace_config(dir: &Path) -> Result<Option<CostConfigFile>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = dir.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<CostConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Read overrides from the process environment.
pub fn load_env_overrides() -> Result<CostConfigFile, ConfigError> {
    overrides_from_vars(std::env::vars())
}

/// Build overrides from `COSTSCOPE_*` key/value pairs.
///
/// Unrelated keys are ignored; recognised keys with unparseable values are an error.
pub fn overrides_from_vars<I, K, V>(vars: I) -> Result<CostConfigFile, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut partial = CostConfigFile::default();

    for (key, value) in vars {
        let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let value = value.as_ref().trim();
        match name {
            "BUCKET_SIZE" => partial.bucket_size = Some(parse_u64(key.as_ref(), value)?),
            "ASYNC" => partial.async_enabled = Some(parse_bool(key.as_ref(), value)?),
            "TRACE_COST_LIMIT" => {
                partial.trace_cost_limit = Some(parse_u64(key.as_ref(), value)?)
            }
            "TRACK_COSTS" => partial.track_costs = Some(parse_bool(key.as_ref(), value)?),
            "TRACK_DETAIL_COSTS" => {
                partial.track_detail_costs = Some(parse_bool(key.as_ref(), value)?)
            }
            _ => {}
        }
    }

    Ok(partial)
}

fn parse_u64(field: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(field, format!("expected milliseconds, got {:?}", value)))
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(
            field,
            format!("expected a boolean, got {:?}", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".costscope.json");
        std::fs::write(&path, r#"{"bucketSize": 100, "trackCosts": false}"#).unwrap();

        let partial = load_config_file(&path).unwrap();
        assert_eq!(partial.bucket_size, Some(100));
        assert_eq!(partial.track_costs, Some(false));
    }

    #[test]
    fn test_load_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".costscope.yaml");
        std::fs::write(&path, "traceCostLimit: 250\nasyncEnabled: false\n").unwrap();

        let partial = load_config_file(&path).unwrap();
        assert_eq!(partial.trace_cost_limit, Some(250));
        assert_eq!(partial.async_enabled, Some(false));
    }

    #[test]
    fn test_workspace_search_order() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("costscope.config.json"), r#"{"bucketSize": 3}"#).unwrap();
        std::fs::write(temp.path().join(".costscope.json"), r#"{"bucketSize": 1}"#).unwrap();

        let partial = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(partial.bucket_size, Some(1));
    }

    #[test]
    fn test_workspace_missing() {
        let temp = TempDir::new().unwrap();
        assert!(load_workspace_config(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".costscope.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            ("COSTSCOPE_BUCKET_SIZE", "500"),
            ("COSTSCOPE_ASYNC", "off"),
            ("COSTSCOPE_TRACK_DETAIL_COSTS", "FALSE"),
            ("PATH", "/usr/bin"),
        ];
        let partial = overrides_from_vars(vars).unwrap();
        assert_eq!(partial.bucket_size, Some(500));
        assert_eq!(partial.async_enabled, Some(false));
        assert_eq!(partial.track_detail_costs, Some(false));
        assert!(partial.track_costs.is_none());
    }

    #[test]
    fn test_env_override_invalid_value() {
        let err = overrides_from_vars(vec![("COSTSCOPE_TRACE_COST_LIMIT", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "COSTSCOPE_TRACE_COST_LIMIT"
        ));
    }
}
