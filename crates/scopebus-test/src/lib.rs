//! Scopebus Test - shared test utilities for the scopebus event registry.
//!
//! This crate provides recording callbacks and prepared buses that can be
//! used from integration tests as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! scopebus-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use scopebus_test::{CallLog, PING, test_bus};
//!
//! #[test]
//! fn test_order() {
//!     let bus = test_bus();
//!     let log = CallLog::new();
//!     bus.on_sync(&PING, log.sync_callback("a"));
//!     bus.on_sync(&PING, log.sync_callback("b"));
//!
//!     bus.fire_sync(&PING, &()).unwrap();
//!     assert_eq!(log.entries(), ["a", "b"]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod recorder;

pub use fixtures::*;
pub use harness::*;
pub use recorder::*;
