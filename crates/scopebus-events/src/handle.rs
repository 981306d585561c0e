//! Identifiers: callback handles and scope ids.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EventError, EventResult};

/// Opaque handle returned when a callback is registered.
///
/// Handles are random 128-bit values, unique across the whole bus. They are
/// rendered in the hyphenated 8-4-4-4-12 form; callers should assume nothing
/// beyond uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackHandle(Uuid);

impl CallbackHandle {
    /// Create a new random handle.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for CallbackHandle {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

static SCOPE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("invalid regex"));

/// Validated identifier of a scope.
///
/// Scope ids are non-empty and made of ASCII letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Validate and wrap a scope id.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidScopeId`] if `id` is empty or contains
    /// anything other than word characters.
    pub fn new(id: impl Into<String>) -> EventResult<Self> {
        let id = id.into();
        if SCOPE_ID.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(EventError::InvalidScopeId { id })
        }
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ScopeId {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ScopeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
