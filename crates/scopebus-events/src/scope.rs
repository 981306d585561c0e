//! Scopes: named partitions of the registry.
//!
//! A component creates its scope once through
//! [`EventBus::create_scope`](crate::EventBus::create_scope) and registers its
//! callbacks through the returned [`Scope`]. The bus can freeze a scope, after
//! which registrations and removals through it are rejected while the
//! callbacks it already owns keep firing.
//!
//! Scope-level operations report failures as [`EventResult`] values instead of
//! panicking: a frozen scope is an expected runtime condition, for example a
//! subsystem that has shut down.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use crate::bus::{EventBus, erase_async, erase_sync};
use crate::catalog::EventDefinition;
use crate::error::{CallbackResult, EventError, EventResult};
use crate::handle::{CallbackHandle, ScopeId};
use crate::key::{EventArgs, EventKey};
use crate::registry::{CallbackKind, Registration};

#[derive(Debug)]
struct ScopeState {
    id: ScopeId,
    frozen: bool,
}

/// Scopes in creation order, indexed by id.
#[derive(Debug, Default)]
pub(crate) struct ScopeTable {
    scopes: Vec<ScopeState>,
    by_id: HashMap<String, usize>,
}

impl ScopeTable {
    pub(crate) fn new() -> Self {
        Self {
            scopes: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub(crate) fn create(&mut self, id: ScopeId) -> EventResult<()> {
        if self.by_id.contains_key(id.as_str()) {
            return Err(EventError::DuplicateScope { id: id.to_string() });
        }
        self.by_id.insert(id.to_string(), self.scopes.len());
        self.scopes.push(ScopeState { id, frozen: false });
        Ok(())
    }

    fn get(&self, id: &str) -> EventResult<&ScopeState> {
        self.by_id
            .get(id)
            .map(|&index| &self.scopes[index])
            .ok_or_else(|| EventError::UnknownScope { id: id.to_owned() })
    }

    pub(crate) fn is_frozen(&self, id: &str) -> EventResult<bool> {
        self.get(id).map(|scope| scope.frozen)
    }

    pub(crate) fn set_frozen(&mut self, id: &str, frozen: bool) -> EventResult<()> {
        let index = *self
            .by_id
            .get(id)
            .ok_or_else(|| EventError::UnknownScope { id: id.to_owned() })?;
        self.scopes[index].frozen = frozen;
        Ok(())
    }

    /// Fail with [`EventError::ScopeFrozen`] if the scope is frozen.
    pub(crate) fn ensure_active(&self, id: &ScopeId) -> EventResult<()> {
        if self.is_frozen(id.as_str())? {
            warn!(scope = %id, "Rejected change through frozen scope");
            Err(EventError::ScopeFrozen { id: id.to_string() })
        } else {
            Ok(())
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<(ScopeId, bool)> {
        self.scopes
            .iter()
            .map(|scope| (scope.id.clone(), scope.frozen))
            .collect()
    }
}

/// Forwarding adapter through which one component uses the bus.
///
/// A scope holds nothing but a handle to its bus and its own id. It can tell
/// whether it is frozen but cannot freeze or unfreeze itself; only the bus
/// can.
#[derive(Clone)]
pub struct Scope {
    bus: EventBus,
    id: ScopeId,
}

impl Scope {
    pub(crate) fn new(bus: EventBus, id: ScopeId) -> Self {
        Self { bus, id }
    }

    /// The scope id.
    #[must_use]
    pub fn id(&self) -> &ScopeId {
        &self.id
    }

    /// Whether the bus has frozen this scope.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self.bus.try_is_frozen(self.id.as_str()), Ok(true))
    }

    /// Attach a synchronous callback owned by this scope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ScopeFrozen`] if the scope is frozen, otherwise
    /// the same errors as [`EventBus::try_on_sync`].
    pub fn on_sync<A, F>(&self, key: &EventKey<A>, callback: F) -> EventResult<CallbackHandle>
    where
        A: EventArgs,
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        self.bus
            .register(key, CallbackKind::Sync, erase_sync(callback), Some(&self.id))
    }

    /// Attach an asynchronous callback owned by this scope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ScopeFrozen`] if the scope is frozen, otherwise
    /// the same errors as [`EventBus::try_on_async`].
    pub fn on_async<A, F, Fut>(&self, key: &EventKey<A>, callback: F) -> EventResult<CallbackHandle>
    where
        A: EventArgs,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.bus
            .register(key, CallbackKind::Async, erase_async(callback), Some(&self.id))
    }

    /// Remove a callback owned by this scope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ScopeFrozen`] if the scope is frozen,
    /// [`EventError::UnknownCallback`] if the handle is unknown or already
    /// removed, and [`EventError::ForeignCallback`] if it belongs to another
    /// scope or was registered directly on the bus.
    pub fn off(&self, handle: CallbackHandle) -> EventResult<()> {
        self.bus.unregister(handle, Some(&self.id)).inspect_err(|e| {
            if let EventError::ForeignCallback { .. } = e {
                warn!(scope = %self.id, %handle, "Rejected removal of foreign callback");
            }
        })
    }

    /// Snapshot of the live callbacks owned by this scope.
    #[must_use]
    pub fn list_callbacks(&self) -> Vec<Registration> {
        self.bus
            .list_callbacks_where(|r| r.scope.as_ref() == Some(&self.id))
    }

    /// Snapshot of all events on the bus.
    #[must_use]
    pub fn list_events(&self) -> Vec<EventDefinition> {
        self.bus.list_events()
    }

    /// Fire a synchronous event.
    ///
    /// Firing is not affected by the frozen flag.
    ///
    /// # Errors
    ///
    /// Same as [`EventBus::try_fire_sync`].
    pub fn fire_sync<A: EventArgs>(&self, key: &EventKey<A>, args: &A) -> EventResult<()> {
        self.bus.try_fire_sync(key, args)
    }

    /// Fire an event, awaiting async callbacks one after another.
    ///
    /// Firing is not affected by the frozen flag.
    ///
    /// # Errors
    ///
    /// Same as [`EventBus::try_fire_async`].
    pub async fn fire_async<A: EventArgs>(&self, key: &EventKey<A>, args: A) -> EventResult<()> {
        self.bus.try_fire_async(key, args).await
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PING: EventKey<()> = EventKey::new("ping");
    const JOB: EventKey<u32> = EventKey::new("job");

    #[test]
    fn test_scope_table_create() {
        let mut table = ScopeTable::new();
        table.create(ScopeId::new("net").unwrap()).unwrap();

        let err = table.create(ScopeId::new("net").unwrap()).unwrap_err();
        assert!(matches!(err, EventError::DuplicateScope { .. }));
        assert!(!table.is_frozen("net").unwrap());
    }

    #[test]
    fn test_scope_table_unknown() {
        let mut table = ScopeTable::new();
        assert!(matches!(
            table.is_frozen("ghost"),
            Err(EventError::UnknownScope { .. })
        ));
        assert!(matches!(
            table.set_frozen("ghost", true),
            Err(EventError::UnknownScope { .. })
        ));
    }

    #[test]
    fn test_create_scope_ids() {
        let bus = EventBus::new();
        assert!(bus.try_create_scope("abc_1").is_ok());

        for bad in ["", "has space", "has-dash"] {
            assert!(matches!(
                bus.try_create_scope(bad),
                Err(EventError::InvalidScopeId { .. })
            ));
        }
        assert!(matches!(
            bus.try_create_scope("abc_1"),
            Err(EventError::DuplicateScope { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "invalid scope id")]
    fn test_create_scope_panics_on_bad_id() {
        let bus = EventBus::new();
        let _ = bus.create_scope("has space");
    }

    #[test]
    fn test_freeze_blocks_changes_without_mutation() {
        let bus = EventBus::new();
        bus.define(&PING, false);
        let scope = bus.create_scope("abc_1");
        let handle = scope.on_sync(&PING, |_| Ok(())).unwrap();

        bus.freeze_scope("abc_1");
        assert!(bus.is_frozen("abc_1"));
        assert!(scope.is_frozen());

        let slots_before = bus.slot_count("ping");
        let err = scope.on_sync(&PING, |_| Ok(())).unwrap_err();
        assert!(err.is_frozen());
        let err = scope.off(handle).unwrap_err();
        assert!(err.is_frozen());
        assert_eq!(bus.slot_count("ping"), slots_before);
        assert_eq!(bus.callback_count("ping"), 1);

        bus.unfreeze_scope("abc_1");
        assert!(!scope.is_frozen());
        assert!(scope.on_sync(&PING, |_| Ok(())).is_ok());
        assert!(scope.off(handle).is_ok());
    }

    #[test]
    fn test_frozen_scope_async_registration() {
        let bus = EventBus::new();
        bus.define(&JOB, true);
        let scope = bus.create_scope("worker");
        bus.freeze_scope("worker");

        let err = scope.on_async(&JOB, |_| async { Ok(()) }).unwrap_err();
        assert!(err.is_frozen());
        assert_eq!(bus.slot_count("job"), 0);
    }

    #[test]
    fn test_frozen_scope_callbacks_still_fire() {
        let bus = EventBus::new();
        bus.define(&PING, false);
        let scope = bus.create_scope("ui");
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        scope
            .on_sync(&PING, move |_| {
                fired_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        bus.freeze_scope("ui");
        scope.fire_sync(&PING, &()).unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_foreign_callback() {
        let bus = EventBus::new();
        bus.define(&PING, false);
        let first = bus.create_scope("first");
        let second = bus.create_scope("second");

        let owned = first.on_sync(&PING, |_| Ok(())).unwrap();
        let direct = bus.on_sync(&PING, |_| Ok(()));

        assert!(matches!(
            second.off(owned),
            Err(EventError::ForeignCallback { .. })
        ));
        assert!(matches!(
            second.off(direct),
            Err(EventError::ForeignCallback { .. })
        ));
        assert_eq!(bus.callback_count("ping"), 2);

        assert!(first.off(owned).is_ok());
        assert!(matches!(
            first.off(owned),
            Err(EventError::UnknownCallback { .. })
        ));
    }

    #[test]
    fn test_scope_errors_are_results() {
        let bus = EventBus::new();
        let scope = bus.create_scope("quiet");

        assert!(matches!(
            scope.on_sync(&PING, |_| Ok(())),
            Err(EventError::UnknownEvent { .. })
        ));
        bus.define(&PING, false);
        assert!(matches!(
            scope.on_async(&PING, |_| async { Ok(()) }),
            Err(EventError::AsyncNotAllowed { .. })
        ));
        assert!(matches!(
            scope.fire_sync(&JOB, &1),
            Err(EventError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn test_scope_list_callbacks() {
        let bus = EventBus::new();
        bus.define(&PING, false);
        bus.define(&JOB, true);
        let net = bus.create_scope("net");
        let ui = bus.create_scope("ui");

        let a = net.on_sync(&PING, |_| Ok(())).unwrap();
        ui.on_sync(&PING, |_| Ok(())).unwrap();
        let b = net.on_async(&JOB, |_| async { Ok(()) }).unwrap();
        bus.on_sync(&PING, |_| Ok(()));

        let owned: Vec<CallbackHandle> = net.list_callbacks().iter().map(|r| r.handle).collect();
        assert_eq!(owned, vec![a, b]);
        assert_eq!(bus.list_callbacks().len(), 4);
        assert_eq!(net.list_events().len(), 2);

        let registration = bus.describe(a);
        assert_eq!(registration.scope.as_ref(), Some(net.id()));
    }

    #[test]
    fn test_scope_lookup_and_listing() {
        let bus = EventBus::new();
        let _ = bus.create_scope("a");
        let _ = bus.create_scope("b");
        bus.freeze_scope("b");

        let again = bus.scope("a").unwrap();
        assert_eq!(again.id().as_str(), "a");
        assert!(matches!(
            bus.scope("missing"),
            Err(EventError::UnknownScope { .. })
        ));

        let listed: Vec<(String, bool)> = bus
            .list_scopes()
            .into_iter()
            .map(|(id, frozen)| (id.to_string(), frozen))
            .collect();
        assert_eq!(
            listed,
            vec![("a".to_string(), false), ("b".to_string(), true)]
        );
    }

    #[test]
    #[should_panic(expected = "unknown scope: ghost")]
    fn test_freeze_unknown_scope_panics() {
        let bus = EventBus::new();
        bus.freeze_scope("ghost");
    }

    #[test]
    fn test_scope_toggles_indefinitely() {
        let bus = EventBus::new();
        let scope = bus.create_scope("toggle");
        for _ in 0..3 {
            bus.freeze_scope("toggle");
            assert!(scope.is_frozen());
            bus.unfreeze_scope("toggle");
            assert!(!scope.is_frozen());
        }
        assert!(bus.try_is_frozen("toggle").is_ok());
    }
}
