//! Prelude module - commonly used types for convenient import.
//!
//! Use `use scopebus_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use scopebus_events::prelude::*;
//!
//! # async fn example() -> EventResult<()> {
//! let flushed: EventKey<Payload> = EventKey::untyped("flushed");
//!
//! let bus = EventBus::new();
//! bus.define(&flushed, true);
//!
//! let writer = bus.create_scope("writer");
//! writer.on_async(&flushed, |args| async move {
//!     println!("flushed {} values", args.len());
//!     Ok(())
//! })?;
//!
//! bus.fire_async(&flushed, vec![serde_json::json!(512)]).await?;
//! # Ok(())
//! # }
//! ```

// Bus and scopes
pub use crate::{EventBus, Scope};

// Keys and identifiers
pub use crate::{CallbackHandle, EventArgs, EventKey, Payload, ScopeId};

// Snapshots
pub use crate::{CallbackKind, EventDefinition, Registration};

// Errors
pub use crate::{CallbackError, CallbackResult, EventError, EventResult};
