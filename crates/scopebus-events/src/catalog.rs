//! Event catalog: the set of declared events.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{EventError, EventResult};
use crate::key::ArgsType;

/// Position of an event in definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct EventIndex(usize);

impl EventIndex {
    pub(crate) fn get(self) -> usize {
        self.0
    }
}

/// Snapshot of a declared event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDefinition {
    name: String,
    allow_async: bool,
    args: &'static str,
}

impl EventDefinition {
    /// The event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether async callbacks may be registered on this event.
    #[must_use]
    pub fn allow_async(&self) -> bool {
        self.allow_async
    }

    /// Printable name of the argument type the event carries.
    #[must_use]
    pub fn args_type(&self) -> &'static str {
        self.args
    }
}

#[derive(Debug)]
struct DefinedEvent {
    definition: EventDefinition,
    args: ArgsType,
}

/// Declared events in definition order, indexed by name.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    events: Vec<DefinedEvent>,
    by_name: HashMap<String, EventIndex>,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Self {
            events: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    pub(crate) fn define(
        &mut self,
        name: &str,
        allow_async: bool,
        args: ArgsType,
    ) -> EventResult<EventIndex> {
        if self.by_name.contains_key(name) {
            return Err(EventError::DuplicateEvent {
                name: name.to_owned(),
            });
        }

        let index = EventIndex(self.events.len());
        self.events.push(DefinedEvent {
            definition: EventDefinition {
                name: name.to_owned(),
                allow_async,
                args: args.name(),
            },
            args,
        });
        self.by_name.insert(name.to_owned(), index);
        Ok(index)
    }

    pub(crate) fn lookup(&self, name: &str) -> EventResult<EventIndex> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EventError::UnknownEvent {
                name: name.to_owned(),
            })
    }

    /// Look up an event and check that it carries `args`.
    pub(crate) fn lookup_typed(&self, name: &str, args: ArgsType) -> EventResult<EventIndex> {
        let index = self.lookup(name)?;
        let expected = self.events[index.0].args;
        if expected == args {
            Ok(index)
        } else {
            Err(EventError::ArgumentMismatch {
                name: name.to_owned(),
                expected: expected.name(),
                found: args.name(),
            })
        }
    }

    pub(crate) fn definition(&self, index: EventIndex) -> &EventDefinition {
        &self.events[index.0].definition
    }

    pub(crate) fn find(&self, name: &str) -> Option<&EventDefinition> {
        self.by_name.get(name).map(|index| self.definition(*index))
    }

    pub(crate) fn indices(&self) -> impl Iterator<Item = EventIndex> + '_ {
        (0..self.events.len()).map(EventIndex)
    }

    pub(crate) fn snapshot(&self) -> Vec<EventDefinition> {
        self.events.iter().map(|e| e.definition.clone()).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let mut catalog = Catalog::new();
        let ping = catalog.define("ping", false, ArgsType::of::<()>()).unwrap();
        let job = catalog.define("job", true, ArgsType::of::<u32>()).unwrap();

        assert_ne!(ping, job);
        assert_eq!(catalog.lookup("ping").unwrap(), ping);
        assert!(catalog.definition(job).allow_async());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_duplicate_event() {
        let mut catalog = Catalog::new();
        catalog.define("ping", false, ArgsType::of::<()>()).unwrap();

        let err = catalog
            .define("ping", true, ArgsType::of::<()>())
            .unwrap_err();
        assert!(matches!(err, EventError::DuplicateEvent { ref name } if name == "ping"));
        // The first definition is untouched.
        assert!(!catalog.find("ping").unwrap().allow_async());
    }

    #[test]
    fn test_unknown_event() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.lookup("nope"),
            Err(EventError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn test_lookup_typed_mismatch() {
        let mut catalog = Catalog::new();
        catalog.define("tick", false, ArgsType::of::<u64>()).unwrap();

        assert!(catalog.lookup_typed("tick", ArgsType::of::<u64>()).is_ok());
        let err = catalog
            .lookup_typed("tick", ArgsType::of::<String>())
            .unwrap_err();
        assert!(matches!(err, EventError::ArgumentMismatch { .. }));
    }

    #[test]
    fn test_snapshot_keeps_definition_order() {
        let mut catalog = Catalog::new();
        for name in ["c", "a", "b"] {
            catalog.define(name, false, ArgsType::of::<()>()).unwrap();
        }

        let mut snapshot = catalog.snapshot();
        let names: Vec<&str> = snapshot.iter().map(EventDefinition::name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        snapshot.clear();
        assert_eq!(catalog.snapshot().len(), 3);
    }
}
