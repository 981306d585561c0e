//! The event bus: catalog, registry and scopes behind one handle.

use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tracing::{debug, error, trace};

use crate::catalog::{Catalog, EventDefinition, EventIndex};
use crate::error::{CallbackResult, EventError, EventResult};
use crate::handle::{CallbackHandle, ScopeId};
use crate::key::{ArgsType, EventArgs, EventKey};
use crate::registry::{
    AsyncFn, CallbackKind, Entry, ErasedCallback, Registration, Registry, SyncFn,
};
use crate::scope::{Scope, ScopeTable};

#[derive(Debug)]
struct State {
    catalog: Catalog,
    registry: Registry,
    scopes: ScopeTable,
}

/// In-process event registry.
///
/// Events are declared once with [`define`](Self::define), callbacks are
/// attached with [`on_sync`](Self::on_sync) / [`on_async`](Self::on_async)
/// (or through a [`Scope`]), and events are fired with
/// [`fire_sync`](Self::fire_sync) / [`fire_async`](Self::fire_async).
/// Callbacks run in registration order.
///
/// Bus-level operations treat misuse (duplicate names, unknown events or
/// handles, malformed scope ids) as a programmer error and panic. Every such
/// operation has a `try_` variant that returns the [`EventError`] instead.
///
/// Cloning the bus is cheap; clones share the same registry.
///
/// **WARNING:** Storing a clone of the bus inside one of its own callbacks
/// creates an `Arc` reference cycle and the registry is never freed.
#[derive(Debug, Clone)]
pub struct EventBus {
    state: Arc<RwLock<State>>,
}

/// Report a bus-level misuse and panic.
#[track_caller]
fn misuse(e: &EventError) -> ! {
    error!(error = %e, "Event registry misuse");
    panic!("{e}");
}

/// Unwrap a bus-level result, panicking on misuse.
#[track_caller]
fn raise<T>(result: EventResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => misuse(&e),
    }
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State {
                catalog: Catalog::new(),
                registry: Registry::new(),
                scopes: ScopeTable::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().expect("lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().expect("lock poisoned")
    }

    // ---------------------------------------------------------------------
    // Event catalog
    // ---------------------------------------------------------------------

    /// Declare an event.
    ///
    /// # Panics
    ///
    /// Panics if an event with the same name was already defined.
    #[track_caller]
    pub fn define<A: EventArgs>(&self, key: &EventKey<A>, allow_async: bool) {
        raise(self.try_define(key, allow_async));
    }

    /// Declare an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DuplicateEvent`] if the name is already defined.
    pub fn try_define<A: EventArgs>(
        &self,
        key: &EventKey<A>,
        allow_async: bool,
    ) -> EventResult<()> {
        let mut guard = self.write();
        let state = &mut *guard;
        let event = state
            .catalog
            .define(key.name(), allow_async, EventKey::<A>::args_type())?;
        state.registry.open(event);
        debug!(event = key.name(), allow_async, "Event defined");
        Ok(())
    }

    /// Snapshot of all defined events in definition order.
    #[must_use]
    pub fn list_events(&self) -> Vec<EventDefinition> {
        self.read().catalog.snapshot()
    }

    /// Definition of the named event, if any.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<EventDefinition> {
        self.read().catalog.find(name).cloned()
    }

    /// Whether an event with this name was defined.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.read().catalog.find(name).is_some()
    }

    // ---------------------------------------------------------------------
    // Callback registry
    // ---------------------------------------------------------------------

    /// Attach a synchronous callback directly on the bus.
    ///
    /// # Panics
    ///
    /// Panics if the event is unknown or was defined with another argument type.
    #[track_caller]
    pub fn on_sync<A, F>(&self, key: &EventKey<A>, callback: F) -> CallbackHandle
    where
        A: EventArgs,
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        raise(self.try_on_sync(key, callback))
    }

    /// Attach a synchronous callback directly on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`] or [`EventError::ArgumentMismatch`].
    pub fn try_on_sync<A, F>(&self, key: &EventKey<A>, callback: F) -> EventResult<CallbackHandle>
    where
        A: EventArgs,
        F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
    {
        self.register(key, CallbackKind::Sync, erase_sync(callback), None)
    }

    /// Attach an asynchronous callback directly on the bus.
    ///
    /// # Panics
    ///
    /// Panics if the event is unknown, does not allow async callbacks, or was
    /// defined with another argument type.
    #[track_caller]
    pub fn on_async<A, F, Fut>(&self, key: &EventKey<A>, callback: F) -> CallbackHandle
    where
        A: EventArgs,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        raise(self.try_on_async(key, callback))
    }

    /// Attach an asynchronous callback directly on the bus.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`], [`EventError::AsyncNotAllowed`] or
    /// [`EventError::ArgumentMismatch`].
    pub fn try_on_async<A, F, Fut>(
        &self,
        key: &EventKey<A>,
        callback: F,
    ) -> EventResult<CallbackHandle>
    where
        A: EventArgs,
        F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallbackResult> + Send + 'static,
    {
        self.register(key, CallbackKind::Async, erase_async(callback), None)
    }

    /// Remove a callback by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is unknown or was already removed.
    #[track_caller]
    pub fn off(&self, handle: CallbackHandle) {
        raise(self.try_off(handle));
    }

    /// Remove a callback by handle.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownCallback`] if the handle is unknown or was
    /// already removed.
    pub fn try_off(&self, handle: CallbackHandle) -> EventResult<()> {
        self.unregister(handle, None)
    }

    /// Look up the registration behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is unknown or was already removed.
    #[track_caller]
    #[must_use]
    pub fn describe(&self, handle: CallbackHandle) -> Registration {
        raise(self.try_describe(handle))
    }

    /// Look up the registration behind a handle.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownCallback`] if the handle is unknown or was
    /// already removed.
    pub fn try_describe(&self, handle: CallbackHandle) -> EventResult<Registration> {
        let state = self.read();
        let (event, entry) = state.registry.entry(handle)?;
        Ok(registration(&state.catalog, event, entry))
    }

    /// Snapshot of every live registration, in event then slot order.
    ///
    /// Registrations are grouped by event in definition order. Callers must
    /// not assume global registration order across events.
    #[must_use]
    pub fn list_callbacks(&self) -> Vec<Registration> {
        self.list_callbacks_where(|_| true)
    }

    /// Snapshot of the live registrations accepted by `filter`.
    pub fn list_callbacks_where<P>(&self, filter: P) -> Vec<Registration>
    where
        P: Fn(&Registration) -> bool,
    {
        let state = self.read();
        let catalog = &state.catalog;
        let registry = &state.registry;
        catalog
            .indices()
            .flat_map(|event| {
                registry
                    .live(event)
                    .map(move |entry| registration(catalog, event, entry))
            })
            .filter(|r| filter(r))
            .collect()
    }

    /// Number of live callbacks attached to the named event.
    #[must_use]
    pub fn callback_count(&self, name: &str) -> usize {
        let state = self.read();
        state
            .catalog
            .lookup(name)
            .map_or(0, |event| state.registry.live(event).count())
    }

    /// Number of slots ever allocated for the named event, removed ones included.
    #[must_use]
    pub fn slot_count(&self, name: &str) -> usize {
        let state = self.read();
        state
            .catalog
            .lookup(name)
            .map_or(0, |event| state.registry.slot_count(event))
    }

    // ---------------------------------------------------------------------
    // Firing
    // ---------------------------------------------------------------------

    /// Invoke every synchronous callback of an event in registration order.
    ///
    /// The first callback error stops the pass and is returned as
    /// [`EventError::Callback`]; later callbacks do not run.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Callback`] if a callback fails.
    ///
    /// # Panics
    ///
    /// Panics if the event is unknown, allows async callbacks, or was defined
    /// with another argument type.
    #[track_caller]
    pub fn fire_sync<A: EventArgs>(&self, key: &EventKey<A>, args: &A) -> EventResult<()> {
        match self.try_fire_sync(key, args) {
            Err(e) if !e.is_callback() => misuse(&e),
            other => other,
        }
    }

    /// Invoke every synchronous callback of an event in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`], [`EventError::SyncOnAsyncEvent`],
    /// [`EventError::ArgumentMismatch`], or [`EventError::Callback`] for the
    /// first failing callback.
    pub fn try_fire_sync<A: EventArgs>(&self, key: &EventKey<A>, args: &A) -> EventResult<()> {
        let (event, len) = {
            let state = self.read();
            let event = state.catalog.lookup(key.name())?;
            if state.catalog.definition(event).allow_async() {
                return Err(EventError::SyncOnAsyncEvent {
                    name: key.name().to_owned(),
                });
            }
            let event = state
                .catalog
                .lookup_typed(key.name(), EventKey::<A>::args_type())?;
            (event, state.registry.slot_count(event))
        };

        trace!(event = key.name(), slots = len, "Firing sync event");

        for index in 0..len {
            let Some((handle, kind, callback)) = self.live_callback(event, index) else {
                continue;
            };
            if kind != CallbackKind::Sync {
                continue;
            }
            trace!(event = key.name(), %handle, "Invoking callback");
            let f = downcast::<SyncFn<A>, A>(key, &callback)?;
            f(args).map_err(|source| EventError::Callback {
                event: key.name().to_owned(),
                handle,
                source,
            })?;
        }
        Ok(())
    }

    /// Invoke every callback of an event in registration order, awaiting each
    /// async callback before the next one starts.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Callback`] if a callback fails.
    ///
    /// # Panics
    ///
    /// Panics if the event is unknown or was defined with another argument type.
    pub async fn fire_async<A: EventArgs>(&self, key: &EventKey<A>, args: A) -> EventResult<()> {
        match self.try_fire_async(key, args).await {
            Err(e) if !e.is_callback() => misuse(&e),
            other => other,
        }
    }

    /// Invoke every callback of an event in registration order, awaiting each
    /// async callback before the next one starts.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownEvent`], [`EventError::ArgumentMismatch`],
    /// or [`EventError::Callback`] for the first failing callback.
    pub async fn try_fire_async<A: EventArgs>(
        &self,
        key: &EventKey<A>,
        args: A,
    ) -> EventResult<()> {
        let (event, len) = self.fire_target(key)?;
        let args = Arc::new(args);

        trace!(event = key.name(), slots = len, "Firing async event");

        for index in 0..len {
            let Some((handle, kind, callback)) = self.live_callback(event, index) else {
                continue;
            };
            trace!(event = key.name(), %handle, %kind, "Invoking callback");
            let result = match kind {
                CallbackKind::Sync => downcast::<SyncFn<A>, A>(key, &callback)?(&*args),
                CallbackKind::Async => {
                    let pending = downcast::<AsyncFn<A>, A>(key, &callback)?(Arc::clone(&args));
                    drop(callback);
                    pending.await
                },
            };
            result.map_err(|source| EventError::Callback {
                event: key.name().to_owned(),
                handle,
                source,
            })?;
        }
        Ok(())
    }

    /// Resolve the event to fire and snapshot its slot count.
    fn fire_target<A: EventArgs>(&self, key: &EventKey<A>) -> EventResult<(EventIndex, usize)> {
        let state = self.read();
        let event = state
            .catalog
            .lookup_typed(key.name(), EventKey::<A>::args_type())?;
        Ok((event, state.registry.slot_count(event)))
    }

    /// Read the live slot at `index`, cloning its callback out of the lock.
    fn live_callback(
        &self,
        event: EventIndex,
        index: usize,
    ) -> Option<(CallbackHandle, CallbackKind, ErasedCallback)> {
        let state = self.read();
        state
            .registry
            .slot(event, index)
            .map(|entry| (entry.handle, entry.kind, Arc::clone(&entry.callback)))
    }

    // ---------------------------------------------------------------------
    // Scopes
    // ---------------------------------------------------------------------

    /// Create a scope and return its adapter.
    ///
    /// # Panics
    ///
    /// Panics if the id is malformed or a scope with this id already exists.
    #[track_caller]
    #[must_use]
    pub fn create_scope(&self, id: &str) -> Scope {
        raise(self.try_create_scope(id))
    }

    /// Create a scope and return its adapter.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidScopeId`] or [`EventError::DuplicateScope`].
    pub fn try_create_scope(&self, id: &str) -> EventResult<Scope> {
        let id = ScopeId::new(id)?;
        self.write().scopes.create(id.clone())?;
        debug!(scope = %id, "Scope created");
        Ok(Scope::new(self.clone(), id))
    }

    /// Adapter for an existing scope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidScopeId`] or [`EventError::UnknownScope`].
    pub fn scope(&self, id: &str) -> EventResult<Scope> {
        let id = ScopeId::new(id)?;
        self.read().scopes.is_frozen(id.as_str())?;
        Ok(Scope::new(self.clone(), id))
    }

    /// Freeze a scope. Existing callbacks stay attached.
    ///
    /// # Panics
    ///
    /// Panics if the scope does not exist.
    #[track_caller]
    pub fn freeze_scope(&self, id: &str) {
        raise(self.try_freeze_scope(id));
    }

    /// Freeze a scope. Existing callbacks stay attached.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownScope`] if the scope does not exist.
    pub fn try_freeze_scope(&self, id: &str) -> EventResult<()> {
        self.set_frozen(id, true)
    }

    /// Unfreeze a scope.
    ///
    /// # Panics
    ///
    /// Panics if the scope does not exist.
    #[track_caller]
    pub fn unfreeze_scope(&self, id: &str) {
        raise(self.try_unfreeze_scope(id));
    }

    /// Unfreeze a scope.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownScope`] if the scope does not exist.
    pub fn try_unfreeze_scope(&self, id: &str) -> EventResult<()> {
        self.set_frozen(id, false)
    }

    fn set_frozen(&self, id: &str, frozen: bool) -> EventResult<()> {
        self.write().scopes.set_frozen(id, frozen)?;
        debug!(scope = id, frozen, "Scope state changed");
        Ok(())
    }

    /// Whether a scope is frozen.
    ///
    /// # Panics
    ///
    /// Panics if the scope does not exist.
    #[track_caller]
    #[must_use]
    pub fn is_frozen(&self, id: &str) -> bool {
        raise(self.try_is_frozen(id))
    }

    /// Whether a scope is frozen.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownScope`] if the scope does not exist.
    pub fn try_is_frozen(&self, id: &str) -> EventResult<bool> {
        self.read().scopes.is_frozen(id)
    }

    /// Snapshot of all scopes and their frozen flag, in creation order.
    #[must_use]
    pub fn list_scopes(&self) -> Vec<(ScopeId, bool)> {
        self.read().scopes.snapshot()
    }

    // ---------------------------------------------------------------------
    // Shared by bus and scope entry points
    // ---------------------------------------------------------------------

    pub(crate) fn register<A: EventArgs>(
        &self,
        key: &EventKey<A>,
        kind: CallbackKind,
        callback: ErasedCallback,
        scope: Option<&ScopeId>,
    ) -> EventResult<CallbackHandle> {
        let mut guard = self.write();
        let state = &mut *guard;

        if let Some(scope) = scope {
            state.scopes.ensure_active(scope)?;
        }
        let event = state.catalog.lookup(key.name())?;
        if kind == CallbackKind::Async && !state.catalog.definition(event).allow_async() {
            return Err(EventError::AsyncNotAllowed {
                name: key.name().to_owned(),
            });
        }
        let event = state
            .catalog
            .lookup_typed(key.name(), EventKey::<A>::args_type())?;

        let handle = state.registry.push(event, kind, callback, scope.cloned());
        debug!(
            event = key.name(),
            %handle,
            %kind,
            scope = scope.map(ScopeId::as_str),
            "Callback registered"
        );
        Ok(handle)
    }

    pub(crate) fn unregister(
        &self,
        handle: CallbackHandle,
        scope: Option<&ScopeId>,
    ) -> EventResult<()> {
        // The entry is dropped after the lock is released so a callback whose
        // destructor touches the bus cannot deadlock.
        let removed: Entry = {
            let mut guard = self.write();
            let state = &mut *guard;

            if let Some(scope) = scope {
                state.scopes.ensure_active(scope)?;
                let (_, entry) = state.registry.entry(handle)?;
                if entry.scope.as_ref() != Some(scope) {
                    return Err(EventError::ForeignCallback {
                        handle,
                        scope: scope.to_string(),
                    });
                }
            }
            let (event, entry) = state.registry.clear(handle)?;
            debug!(
                event = state.catalog.definition(event).name(),
                %handle,
                scope = scope.map(ScopeId::as_str),
                "Callback removed"
            );
            entry
        };
        drop(removed);
        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn registration(catalog: &Catalog, event: EventIndex, entry: &Entry) -> Registration {
    Registration {
        handle: entry.handle,
        event: catalog.definition(event).name().to_owned(),
        scope: entry.scope.clone(),
        kind: entry.kind,
    }
}

pub(crate) fn erase_sync<A, F>(callback: F) -> ErasedCallback
where
    A: EventArgs,
    F: Fn(&A) -> CallbackResult + Send + Sync + 'static,
{
    let f: SyncFn<A> = Box::new(callback);
    Arc::new(f)
}

pub(crate) fn erase_async<A, F, Fut>(callback: F) -> ErasedCallback
where
    A: EventArgs,
    F: Fn(Arc<A>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallbackResult> + Send + 'static,
{
    let f: AsyncFn<A> = Box::new(move |args| callback(args).boxed());
    Arc::new(f)
}

/// Recover the typed callback from its erased form.
///
/// Registration and firing both check the argument type against the
/// definition, so a failed downcast means the entry was stored with another
/// kind than recorded.
fn downcast<'a, T: 'static, A: EventArgs>(
    key: &EventKey<A>,
    callback: &'a ErasedCallback,
) -> EventResult<&'a T> {
    callback
        .downcast_ref::<T>()
        .ok_or_else(|| EventError::ArgumentMismatch {
            name: key.name().to_owned(),
            expected: ArgsType::of::<A>().name(),
            found: std::any::type_name::<T>(),
        })
}
