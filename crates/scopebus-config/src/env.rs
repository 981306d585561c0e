//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! the config file left unset.

use std::collections::HashMap;

use tracing::debug;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    key: &'static str,
}

/// All supported `SCOPEBUS_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "SCOPEBUS_LOG_LEVEL",
        section: "logging",
        key: "level",
    },
    EnvMapping {
        var_name: "SCOPEBUS_LOG_FORMAT",
        section: "logging",
        key: "format",
    },
];

/// Snapshot the `SCOPEBUS_*` environment variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("SCOPEBUS_"))
        .collect()
}

/// Apply env var fallbacks to `merged` for fields that `file` did not set.
///
/// Returns the number of fields filled from the environment.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    file: Option<&toml::Value>,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied: usize = 0;
    for mapping in ENV_MAPPINGS {
        let Some(value) = env_vars.get(mapping.var_name) else {
            continue;
        };
        let set_by_file = file
            .and_then(|f| f.get(mapping.section))
            .and_then(|s| s.get(mapping.key))
            .is_some();
        if set_by_file {
            continue;
        }

        let Some(table) = merged.as_table_mut() else {
            continue;
        };
        let section = table
            .entry(mapping.section)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(section) = section.as_table_mut() {
            section.insert(mapping.key.to_owned(), toml::Value::String(value.clone()));
            debug!(
                var = mapping.var_name,
                field = %format!("{}.{}", mapping.section, mapping.key),
                "applied env fallback"
            );
            applied = applied.saturating_add(1);
        }
    }
    applied
}
