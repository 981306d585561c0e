//! Prelude module - commonly used test helpers.
//!
//! Use `use scopebus_test::prelude::*;` in integration tests.

pub use crate::{CallLog, JOB, PING, failing_callback, test_bus};
pub use crate::{setup_test_logging, test_config_file};
