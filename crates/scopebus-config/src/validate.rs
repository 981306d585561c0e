//! Post-merge configuration validation.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::BusConfig;

/// Accepted values for `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted values for `logging.format`.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully-merged and deserialized configuration.
///
/// Scope id syntax is checked by the bus when the scopes are created.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &BusConfig) -> ConfigResult<()> {
    validate_events(config)?;
    validate_scopes(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_events(config: &BusConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for (i, event) in config.events.iter().enumerate() {
        if event.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("events[{i}].name"),
                message: "event name must not be empty".to_owned(),
            });
        }
        if !seen.insert(event.name.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("events[{i}].name"),
                message: format!("event '{}' is declared more than once", event.name),
            });
        }
    }
    Ok(())
}

fn validate_scopes(config: &BusConfig) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for (i, scope) in config.scopes.iter().enumerate() {
        if scope.id.is_empty() {
            return Err(ConfigError::ValidationError {
                field: format!("scopes[{i}].id"),
                message: "scope id must not be empty".to_owned(),
            });
        }
        if !seen.insert(scope.id.as_str()) {
            return Err(ConfigError::ValidationError {
                field: format!("scopes[{i}].id"),
                message: format!("scope '{}' is declared more than once", scope.id),
            });
        }
    }
    Ok(())
}

fn validate_logging(config: &BusConfig) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    Ok(())
}
