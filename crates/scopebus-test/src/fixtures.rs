//! Prepared buses and event keys.

use scopebus_events::{EventBus, EventKey};

/// Synchronous test event without arguments.
pub const PING: EventKey<()> = EventKey::new("ping");

/// Async-capable test event carrying a job number.
pub const JOB: EventKey<u32> = EventKey::new("job");

/// Create a bus with [`PING`] (sync only) and [`JOB`] (async allowed) defined.
#[must_use]
pub fn test_bus() -> EventBus {
    let bus = EventBus::new();
    bus.define(&PING, false);
    bus.define(&JOB, true);
    bus
}
