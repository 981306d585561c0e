//! Sequential async dispatch.

use std::time::Duration;

use scopebus_events::EventError;
use scopebus_test::prelude::*;

#[tokio::test]
async fn test_async_callbacks_run_one_after_another() {
    setup_test_logging("scopebus_events=trace");
    let bus = test_bus();
    let log = CallLog::new();

    // The slow callback is registered first and must finish first.
    bus.on_async(&JOB, log.async_callback("slow", Duration::from_millis(30)));
    bus.on_sync(&JOB, log.sync_callback("sync"));
    bus.on_async(&JOB, log.async_callback("fast", Duration::from_millis(1)));

    bus.fire_async(&JOB, 7).await.unwrap();
    assert_eq!(log.entries(), ["slow", "sync", "fast"]);
}

#[tokio::test]
async fn test_scope_async_registration() {
    let bus = test_bus();
    let scope = bus.create_scope("worker");
    let log = CallLog::new();

    scope
        .on_async(&JOB, log.async_callback("worker", Duration::ZERO))
        .unwrap();
    scope.fire_async(&JOB, 1).await.unwrap();
    scope.fire_async(&JOB, 2).await.unwrap();

    assert_eq!(log.len(), 2);
}

#[tokio::test]
async fn test_fire_async_runs_sync_only_events() {
    let bus = test_bus();
    let log = CallLog::new();
    bus.on_sync(&PING, log.sync_callback("ping"));

    bus.fire_async(&PING, ()).await.unwrap();
    assert_eq!(log.entries(), ["ping"]);
}

#[tokio::test]
async fn test_async_failure_stops_the_pass() {
    let bus = test_bus();
    let log = CallLog::new();
    bus.on_sync(&JOB, failing_callback("job failed"));
    bus.on_async(&JOB, log.async_callback("after", Duration::ZERO));

    let err = bus.fire_async(&JOB, 3).await.unwrap_err();
    assert!(matches!(err, EventError::Callback { .. }));
    assert!(log.is_empty());
}
