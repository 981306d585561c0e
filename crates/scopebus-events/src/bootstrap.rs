//! Building a bus from a [`BusConfig`].

use scopebus_config::BusConfig;
use tracing::info;

use crate::bus::EventBus;
use crate::error::EventResult;
use crate::key::EventKey;

impl EventBus {
    /// Build a bus from configuration.
    ///
    /// Every configured event is declared untyped (its callbacks receive a
    /// [`Payload`](crate::Payload)). Scopes are created in order and frozen
    /// afterwards when marked `frozen`.
    ///
    /// # Errors
    ///
    /// Returns the first registry error: a duplicate event name, a malformed
    /// scope id or a duplicate scope.
    pub fn from_config(config: &BusConfig) -> EventResult<Self> {
        let bus = Self::new();

        for event in &config.events {
            bus.try_define(&EventKey::untyped(event.name.clone()), event.allow_async)?;
        }
        for scope in &config.scopes {
            bus.try_create_scope(&scope.id)?;
            if scope.frozen {
                bus.try_freeze_scope(&scope.id)?;
            }
        }

        info!(
            events = config.events.len(),
            scopes = config.scopes.len(),
            "Event bus built from config"
        );
        Ok(bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventError;

    #[test]
    fn test_from_config() {
        let config = BusConfig::default()
            .with_event("ping", false)
            .with_event("job", true)
            .with_scope("net", false)
            .with_scope("ui", true);

        let bus = EventBus::from_config(&config).unwrap();

        let events = bus.list_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "ping");
        assert!(events[1].allow_async());
        assert!(!bus.is_frozen("net"));
        assert!(bus.is_frozen("ui"));
    }

    #[test]
    fn test_configured_events_are_untyped() {
        let config = BusConfig::default().with_event("ping", false);
        let bus = EventBus::from_config(&config).unwrap();

        let key = EventKey::untyped("ping");
        bus.on_sync(&key, |args: &crate::Payload| {
            assert_eq!(args.len(), 1);
            Ok(())
        });
        bus.fire_sync(&key, &vec![serde_json::json!(1)]).unwrap();

        let err = bus
            .try_on_sync(&EventKey::<u32>::new("ping"), |_: &u32| Ok(()))
            .unwrap_err();
        assert!(matches!(err, EventError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_frozen_config_scope_rejects_registration() {
        let config = BusConfig::default()
            .with_event("ping", false)
            .with_scope("locked", true);
        let bus = EventBus::from_config(&config).unwrap();

        let scope = bus.scope("locked").unwrap();
        let err = scope
            .on_sync(&EventKey::untyped("ping"), |_: &crate::Payload| Ok(()))
            .unwrap_err();
        assert!(err.is_frozen());
    }

    #[test]
    fn test_bad_scope_id_is_an_error() {
        let config = BusConfig::default().with_scope("not valid", false);
        let err = EventBus::from_config(&config).unwrap_err();
        assert!(matches!(err, EventError::InvalidScopeId { .. }));
    }

    #[test]
    fn test_duplicate_event_is_an_error() {
        let config = BusConfig::default()
            .with_event("ping", false)
            .with_event("ping", true);
        let err = EventBus::from_config(&config).unwrap_err();
        assert!(matches!(err, EventError::DuplicateEvent { .. }));
    }
}
