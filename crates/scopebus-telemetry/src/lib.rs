//! Scopebus Telemetry - logging setup for the scopebus event registry.
//!
//! The registry itself only emits `tracing` events. This crate installs a
//! subscriber for binaries and test harnesses that want to see them.
//!
//! # Example
//!
//! ```rust,no_run
//! use scopebus_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), scopebus_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("scopebus_events=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```
//!
//! With the `config` feature, a `scopebus_config::LoggingConfig` section
//! converts into a [`LogConfig`] through `TryFrom`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
