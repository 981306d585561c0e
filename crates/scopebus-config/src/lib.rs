#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Declarative configuration for a scopebus event registry.
//!
//! A [`BusConfig`] lists the events to declare, the scopes to create (and
//! whether each starts frozen) and the logging settings.
//!
//! # Usage
//!
//! ```rust,no_run
//! use scopebus_config::BusConfig;
//!
//! let config = BusConfig::load(Some(std::path::Path::new("scopebus.toml"))).unwrap();
//! for event in &config.events {
//!     println!("{} (async: {})", event.name, event.allow_async);
//! }
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file** passed to [`BusConfig::load`]
//! 2. **Environment variables** (`SCOPEBUS_LOG_LEVEL`, `SCOPEBUS_LOG_FORMAT`), fallback only
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other scopebus crates. The events crate
//! consumes it behind its `config` feature.

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl BusConfig {
    /// Load configuration: defaults, then `path`, then env fallbacks.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is malformed or the final
    /// configuration fails validation.
    pub fn load(path: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(path)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Parse configuration from a TOML string (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is malformed or fails
    /// validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        loader::parse_str(content, "<string>")
    }
}
