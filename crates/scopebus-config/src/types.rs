//! Configuration struct definitions.

use serde::{Deserialize, Serialize};

/// Top-level configuration of a bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Events declared when the bus is built.
    pub events: Vec<EventSpec>,
    /// Scopes created when the bus is built.
    pub scopes: Vec<ScopeSpec>,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// One predeclared event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    /// Event name.
    pub name: String,
    /// Whether async callbacks may be attached.
    #[serde(default)]
    pub allow_async: bool,
}

/// One predeclared scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    /// Scope id (ASCII letters, digits, underscore).
    pub id: String,
    /// Start the scope frozen.
    #[serde(default)]
    pub frozen: bool,
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra filter directives such as `scopebus_events=trace`.
    pub directives: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}

impl BusConfig {
    /// Add an event declaration.
    #[must_use]
    pub fn with_event(mut self, name: impl Into<String>, allow_async: bool) -> Self {
        self.events.push(EventSpec {
            name: name.into(),
            allow_async,
        });
        self
    }

    /// Add a scope declaration.
    #[must_use]
    pub fn with_scope(mut self, id: impl Into<String>, frozen: bool) -> Self {
        self.scopes.push(ScopeSpec {
            id: id.into(),
            frozen,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BusConfig::default();
        assert!(config.events.is_empty());
        assert!(config.scopes.is_empty());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_builder() {
        let config = BusConfig::default()
            .with_event("ping", false)
            .with_event("job", true)
            .with_scope("net", true);

        assert_eq!(config.events.len(), 2);
        assert!(config.events[1].allow_async);
        assert!(config.scopes[0].frozen);
    }

    #[test]
    fn test_partial_toml() {
        let config: BusConfig = toml::from_str(
            r#"
            [[events]]
            name = "ping"
            "#,
        )
        .unwrap();

        assert_eq!(config.events[0].name, "ping");
        assert!(!config.events[0].allow_async);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_serialization() {
        let config = BusConfig::default().with_scope("ui", false);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"id\":\"ui\""));

        let parsed: BusConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
