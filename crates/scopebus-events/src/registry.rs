//! Callback storage.
//!
//! Each event owns an append-only list of slots. Registering pushes a new
//! slot at the end; removing clears the slot in place. Indices never move, so
//! handles to other entries stay valid and a fire pass can walk the list by
//! index while callbacks add or remove entries.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::catalog::EventIndex;
use crate::error::{CallbackResult, EventError, EventResult};
use crate::handle::{CallbackHandle, ScopeId};

/// Stored form of a synchronous callback for arguments `A`.
pub(crate) type SyncFn<A> = Box<dyn Fn(&A) -> CallbackResult + Send + Sync>;

/// Stored form of an asynchronous callback for arguments `A`.
pub(crate) type AsyncFn<A> =
    Box<dyn Fn(Arc<A>) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Type-erased callback; holds a `SyncFn<A>` or an `AsyncFn<A>`.
pub(crate) type ErasedCallback = Arc<dyn Any + Send + Sync>;

/// Whether a callback runs to completion or returns a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackKind {
    /// Plain function call.
    Sync,
    /// Returns a future that is awaited before the next callback runs.
    Async,
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

/// Snapshot of one live callback registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Handle of the callback.
    pub handle: CallbackHandle,
    /// Event the callback is attached to.
    pub event: String,
    /// Scope the callback was registered through, `None` if registered on the bus.
    pub scope: Option<ScopeId>,
    /// Sync or async.
    pub kind: CallbackKind,
}

pub(crate) struct Entry {
    pub(crate) handle: CallbackHandle,
    pub(crate) kind: CallbackKind,
    pub(crate) scope: Option<ScopeId>,
    pub(crate) callback: ErasedCallback,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
struct Locator {
    event: EventIndex,
    index: usize,
}

/// Per-event slot lists plus the handle back-references.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    lists: Vec<Vec<Option<Entry>>>,
    locators: HashMap<CallbackHandle, Locator>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            lists: Vec::new(),
            locators: HashMap::new(),
        }
    }

    /// Open an empty list for a newly defined event.
    pub(crate) fn open(&mut self, event: EventIndex) {
        debug_assert_eq!(event.get(), self.lists.len());
        self.lists.push(Vec::new());
    }

    pub(crate) fn push(
        &mut self,
        event: EventIndex,
        kind: CallbackKind,
        callback: ErasedCallback,
        scope: Option<ScopeId>,
    ) -> CallbackHandle {
        let handle = CallbackHandle::new();
        let list = &mut self.lists[event.get()];
        let index = list.len();
        list.push(Some(Entry {
            handle,
            kind,
            scope,
            callback,
        }));
        self.locators.insert(handle, Locator { event, index });
        handle
    }

    pub(crate) fn entry(&self, handle: CallbackHandle) -> EventResult<(EventIndex, &Entry)> {
        let locator = self
            .locators
            .get(&handle)
            .ok_or(EventError::UnknownCallback { handle })?;
        self.lists[locator.event.get()][locator.index]
            .as_ref()
            .map(|entry| (locator.event, entry))
            .ok_or(EventError::UnknownCallback { handle })
    }

    /// Clear the slot of `handle`, returning the removed entry.
    pub(crate) fn clear(&mut self, handle: CallbackHandle) -> EventResult<(EventIndex, Entry)> {
        let locator = self
            .locators
            .remove(&handle)
            .ok_or(EventError::UnknownCallback { handle })?;
        self.lists[locator.event.get()][locator.index]
            .take()
            .map(|entry| (locator.event, entry))
            .ok_or(EventError::UnknownCallback { handle })
    }

    pub(crate) fn slot(&self, event: EventIndex, index: usize) -> Option<&Entry> {
        self.lists[event.get()].get(index)?.as_ref()
    }

    /// Number of slots ever allocated for `event`, tombstones included.
    pub(crate) fn slot_count(&self, event: EventIndex) -> usize {
        self.lists[event.get()].len()
    }

    pub(crate) fn live(&self, event: EventIndex) -> impl Iterator<Item = &Entry> + '_ {
        self.lists[event.get()].iter().flatten()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::key::ArgsType;

    fn noop() -> ErasedCallback {
        let f: SyncFn<()> = Box::new(|_| Ok(()));
        Arc::new(f)
    }

    fn setup() -> (Registry, EventIndex) {
        let mut catalog = Catalog::new();
        let event = catalog.define("ping", false, ArgsType::of::<()>()).unwrap();
        let mut registry = Registry::new();
        registry.open(event);
        (registry, event)
    }

    #[test]
    fn test_push_assigns_increasing_slots() {
        let (mut registry, event) = setup();
        let a = registry.push(event, CallbackKind::Sync, noop(), None);
        let b = registry.push(event, CallbackKind::Sync, noop(), None);

        assert_ne!(a, b);
        assert_eq!(registry.slot_count(event), 2);
        assert_eq!(registry.slot(event, 0).unwrap().handle, a);
        assert_eq!(registry.slot(event, 1).unwrap().handle, b);
    }

    #[test]
    fn test_clear_leaves_tombstone() {
        let (mut registry, event) = setup();
        let a = registry.push(event, CallbackKind::Sync, noop(), None);
        let b = registry.push(event, CallbackKind::Sync, noop(), None);

        registry.clear(a).unwrap();

        assert!(registry.slot(event, 0).is_none());
        assert_eq!(registry.slot(event, 1).unwrap().handle, b);
        assert_eq!(registry.slot_count(event), 2);
        assert_eq!(registry.live(event).count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_cleared_slot_is_never_reused() {
        let (mut registry, event) = setup();
        let a = registry.push(event, CallbackKind::Sync, noop(), None);
        registry.clear(a).unwrap();
        let c = registry.push(event, CallbackKind::Sync, noop(), None);

        assert!(registry.slot(event, 0).is_none());
        assert_eq!(registry.slot(event, 1).unwrap().handle, c);
    }

    #[test]
    fn test_clear_twice_fails() {
        let (mut registry, event) = setup();
        let a = registry.push(event, CallbackKind::Sync, noop(), None);

        assert!(registry.clear(a).is_ok());
        assert!(matches!(
            registry.clear(a),
            Err(EventError::UnknownCallback { handle }) if handle == a
        ));
        assert!(registry.entry(a).is_err());
    }

    #[test]
    fn test_entry_keeps_scope() {
        let (mut registry, event) = setup();
        let scope = ScopeId::new("net").unwrap();
        let a = registry.push(event, CallbackKind::Sync, noop(), Some(scope.clone()));

        let (found_event, entry) = registry.entry(a).unwrap();
        assert_eq!(found_event, event);
        assert_eq!(entry.scope.as_ref(), Some(&scope));
        assert_eq!(entry.kind, CallbackKind::Sync);
    }
}
