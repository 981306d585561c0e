//! Scopebus Events - typed, scoped event registry.
//!
//! This crate provides:
//! - An event catalog where each event is declared once
//! - Synchronous and asynchronous callbacks fired in registration order
//! - Scopes that let a component manage its own callbacks and be frozen
//!
//! # Architecture
//!
//! An [`EventBus`] owns three pieces of state:
//!
//! 1. **Catalog**: declared events, each bound to an argument type through an
//!    [`EventKey`] and flagged with whether async callbacks are allowed.
//!
//! 2. **Registry**: per-event callback lists. Removal clears a slot in place,
//!    so outstanding [`CallbackHandle`]s to other callbacks stay valid and a
//!    callback may remove itself while the event is firing.
//!
//! 3. **Scopes**: named partitions used through [`Scope`] adapters. The bus
//!    can freeze a scope to reject further registrations and removals through
//!    it; scope operations report that as an [`EventError::ScopeFrozen`] value.
//!
//! # Example
//!
//! ```rust
//! use scopebus_events::{EventBus, EventKey};
//!
//! const PING: EventKey<u32> = EventKey::new("ping");
//!
//! let bus = EventBus::new();
//! bus.define(&PING, false);
//!
//! let net = bus.create_scope("net");
//! let handle = net
//!     .on_sync(&PING, |seq| {
//!         println!("ping #{seq}");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! bus.fire_sync(&PING, &1).unwrap();
//!
//! bus.freeze_scope("net");
//! assert!(net.off(handle).unwrap_err().is_frozen());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

#[cfg(feature = "config")]
mod bootstrap;
mod bus;
mod catalog;
mod error;
mod handle;
mod key;
mod registry;
mod scope;

pub use bus::EventBus;
pub use catalog::EventDefinition;
pub use error::{CallbackError, CallbackResult, EventError, EventResult};
pub use handle::{CallbackHandle, ScopeId};
pub use key::{EventArgs, EventKey, Payload};
pub use registry::{CallbackKind, Registration};
pub use scope::Scope;
