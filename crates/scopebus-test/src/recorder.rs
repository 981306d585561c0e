//! Recording callbacks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use scopebus_events::{CallbackError, CallbackResult};

/// Shared log of callback invocations, in call order.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a label.
    pub fn record(&self, label: impl Into<String>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(label.into());
        }
    }

    /// A sync callback that records `label` each time it runs.
    pub fn sync_callback<A: 'static>(
        &self,
        label: &str,
    ) -> impl Fn(&A) -> CallbackResult + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_owned();
        move |_: &A| {
            log.record(label.clone());
            CallbackResult::Ok(())
        }
    }

    /// An async callback that sleeps for `delay`, then records `label`.
    pub fn async_callback<A: Send + Sync + 'static>(
        &self,
        label: &str,
        delay: Duration,
    ) -> impl Fn(Arc<A>) -> BoxFuture<'static, CallbackResult> + Send + Sync + 'static {
        let log = self.clone();
        let label = label.to_owned();
        move |_: Arc<A>| {
            let log = log.clone();
            let label = label.clone();
            async move {
                tokio::time::sleep(delay).await;
                log.record(label);
                CallbackResult::Ok(())
            }
            .boxed()
        }
    }

    /// Snapshot of the recorded labels.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.clear();
        }
    }
}

/// A sync callback that always fails with `message`.
pub fn failing_callback<A: 'static>(
    message: &str,
) -> impl Fn(&A) -> CallbackResult + Send + Sync + 'static {
    let message = message.to_owned();
    move |_: &A| Err(CallbackError::from(message.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_callback_records() {
        let log = CallLog::new();
        let a = log.sync_callback::<u32>("a");
        let b = log.sync_callback::<u32>("b");

        a(&1).unwrap();
        b(&2).unwrap();
        a(&3).unwrap();

        assert_eq!(log.entries(), ["a", "b", "a"]);
        log.clear();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_async_callback_records_after_delay() {
        let log = CallLog::new();
        let cb = log.async_callback::<u32>("slow", Duration::from_millis(5));

        let fut = cb(Arc::new(7));
        assert!(log.is_empty());
        fut.await.unwrap();
        assert_eq!(log.entries(), ["slow"]);
    }

    #[test]
    fn test_failing_callback() {
        let cb = failing_callback::<()>("boom");
        let err = cb(&()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
