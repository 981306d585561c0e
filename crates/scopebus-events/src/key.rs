//! Typed event keys.
//!
//! An [`EventKey`] binds an event name to the argument type its callbacks
//! receive. Keys are usually declared as constants next to the component that
//! owns the event:
//!
//! ```rust
//! use scopebus_events::EventKey;
//!
//! pub struct Flushed {
//!     pub bytes: usize,
//! }
//!
//! pub const FLUSHED: EventKey<Flushed> = EventKey::new("flushed");
//! ```
//!
//! Callers that only know event names at runtime use [`EventKey::untyped`],
//! whose argument is a variadic [`Payload`].

use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Variadic argument list for events declared without a Rust type.
pub type Payload = Vec<serde_json::Value>;

/// Marker for types that can be carried by an event.
pub trait EventArgs: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> EventArgs for T {}

/// Name of an event together with the type of its arguments.
pub struct EventKey<A: EventArgs> {
    name: Cow<'static, str>,
    _args: PhantomData<fn(&A)>,
}

impl<A: EventArgs> EventKey<A> {
    /// Create a key with a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _args: PhantomData,
        }
    }

    /// Create a key with a name only known at runtime.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _args: PhantomData,
        }
    }

    /// The event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn args_type() -> ArgsType {
        ArgsType::of::<A>()
    }
}

impl EventKey<Payload> {
    /// Create a key for an event whose arguments are an untyped list.
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::named(name)
    }
}

impl<A: EventArgs> Clone for EventKey<A> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _args: PhantomData,
        }
    }
}

impl<A: EventArgs> fmt::Debug for EventKey<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventKey")
            .field("name", &self.name)
            .field("args", &type_name::<A>())
            .finish()
    }
}

/// Runtime identity of an argument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArgsType {
    id: TypeId,
    name: &'static str,
}

impl ArgsType {
    pub(crate) fn of<A: 'static>() -> Self {
        Self {
            id: TypeId::of::<A>(),
            name: type_name::<A>(),
        }
    }

    pub(crate) fn name(self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: EventKey<()> = EventKey::new("ping");

    #[test]
    fn test_const_key() {
        assert_eq!(PING.name(), "ping");
        assert_eq!(PING.clone().name(), "ping");
    }

    #[test]
    fn test_untyped_key() {
        let key = EventKey::untyped(String::from("dynamic"));
        assert_eq!(key.name(), "dynamic");
        assert_eq!(
            EventKey::<Payload>::args_type(),
            ArgsType::of::<Vec<serde_json::Value>>()
        );
    }

    #[test]
    fn test_args_type_distinguishes_types() {
        assert_ne!(ArgsType::of::<u32>(), ArgsType::of::<u64>());
        assert!(ArgsType::of::<(u8, String)>().name().contains("u8"));
    }
}
