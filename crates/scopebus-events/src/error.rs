//! Registry error types.

use thiserror::Error;

use crate::handle::CallbackHandle;

/// Error returned by a user-supplied callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by user-supplied callbacks.
pub type CallbackResult = Result<(), CallbackError>;

/// Errors that can occur when operating on the event registry.
#[derive(Debug, Error)]
pub enum EventError {
    /// An event with this name was already defined.
    #[error("event already defined: {name}")]
    DuplicateEvent {
        /// The event name.
        name: String,
    },

    /// No event with this name was ever defined.
    #[error("unknown event: {name}")]
    UnknownEvent {
        /// The event name.
        name: String,
    },

    /// The event was defined without `allow_async`.
    #[error("event {name} does not accept async callbacks")]
    AsyncNotAllowed {
        /// The event name.
        name: String,
    },

    /// The event accepts async callbacks and must be fired with `fire_async`.
    #[error("event {name} allows async callbacks; use fire_async")]
    SyncOnAsyncEvent {
        /// The event name.
        name: String,
    },

    /// The argument type used does not match the one the event was defined with.
    #[error("event {name} carries {expected}, not {found}")]
    ArgumentMismatch {
        /// The event name.
        name: String,
        /// Argument type the event was defined with.
        expected: &'static str,
        /// Argument type the caller used.
        found: &'static str,
    },

    /// The handle is unknown or its callback was already removed.
    #[error("unknown callback: {handle}")]
    UnknownCallback {
        /// The handle that was looked up.
        handle: CallbackHandle,
    },

    /// The scope id is empty or contains non-word characters.
    #[error("invalid scope id: {id:?}")]
    InvalidScopeId {
        /// The rejected id.
        id: String,
    },

    /// A scope with this id already exists.
    #[error("scope already exists: {id}")]
    DuplicateScope {
        /// The scope id.
        id: String,
    },

    /// No scope with this id exists.
    #[error("unknown scope: {id}")]
    UnknownScope {
        /// The scope id.
        id: String,
    },

    /// The scope is frozen and rejects registrations and removals.
    #[error("scope {id} is frozen")]
    ScopeFrozen {
        /// The scope id.
        id: String,
    },

    /// The callback belongs to a different scope than the one removing it.
    #[error("callback {handle} does not belong to scope {scope}")]
    ForeignCallback {
        /// The handle being removed.
        handle: CallbackHandle,
        /// The scope that attempted the removal.
        scope: String,
    },

    /// A callback failed while the event was being fired.
    #[error("callback {handle} for event {event} failed: {source}")]
    Callback {
        /// The event being fired.
        event: String,
        /// The failing callback.
        handle: CallbackHandle,
        /// The error returned by the callback.
        #[source]
        source: CallbackError,
    },
}

impl EventError {
    /// Whether this error reports a frozen scope.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::ScopeFrozen { .. })
    }

    /// Whether this error came from a callback rather than from the registry.
    #[must_use]
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}

/// Result type for registry operations.
pub type EventResult<T> = Result<T, EventError>;
