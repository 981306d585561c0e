//! Config file loading.
//!
//! Implements the `BusConfig::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge the config file, if one is given and exists
//! 3. Apply env var fallbacks for unset logging fields
//! 4. Deserialize merged tree → `BusConfig`
//! 5. Validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::BusConfig;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the configuration: defaults, then `path`, then env fallbacks.
///
/// A missing file is not an error; the defaults are used.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is unreadable or malformed, or if the
/// merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<BusConfig> {
    load_with_env(path, &collect_env_vars())
}

/// [`load`] with an explicit environment, for embedders and tests.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with_env(
    path: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<BusConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let overlay = match path {
        Some(path) => try_load_file(path)?,
        None => None,
    };
    if let (Some(overlay), Some(path)) = (&overlay, path) {
        deep_merge(&mut merged, overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let env_count = apply_env_fallbacks(&mut merged, overlay.as_ref(), env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config = merged
        .try_into::<BusConfig>()
        .map_err(|e| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no defaults layer, no env).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<BusConfig> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    check_size(path, metadata.len())?;

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_str(&content, &path.display().to_string())
}

/// Parse and validate a config from a TOML string.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the string is malformed or fails validation.
pub fn parse_str(content: &str, origin: &str) -> ConfigResult<BusConfig> {
    let config: BusConfig = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

fn check_size(path: &Path, len: u64) -> ConfigResult<()> {
    if len > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {len} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }
    Ok(())
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    // Check size after reading to avoid TOCTOU between stat and read.
    check_size(path, u64::try_from(content.len()).unwrap_or(u64::MAX))?;

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}
