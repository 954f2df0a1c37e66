//! Data-source routing preference.
//!
//! Queries executed while a preference is current are routed to the named
//! cluster member unless the query's own options already choose one.

use crate::dispatch::Dispatch;
use crate::error::ContextResult;
use crate::slot::ContextSlot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Options key the query layer reads the routing preference from.
const READ_KEY: &str = "read";

/// Which cluster member reads should be served by.
///
/// Serialized as a bare string; values other than `primary` and `secondary`
/// are carried through untouched for the query layer to interpret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReadPreference {
    Primary,
    Secondary,
    Named(String),
}

impl ReadPreference {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Named(name) => name,
        }
    }
}

impl From<&str> for ReadPreference {
    fn from(value: &str) -> Self {
        match value {
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            other => Self::Named(other.to_string()),
        }
    }
}

impl From<String> for ReadPreference {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ReadPreference> for String {
    fn from(value: ReadPreference) -> Self {
        match value {
            ReadPreference::Named(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ReadPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The routing slot.
pub static READ_PREFERENCE: ContextSlot<ReadPreference> = ContextSlot::new("read_preference");

/// Runs `body` with reads routed to the primary.
pub fn with_primary<R>(body: impl FnOnce() -> R) -> R {
    READ_PREFERENCE.with_scope(ReadPreference::Primary, body)
}

/// Runs `body` with reads routed to a secondary.
pub fn with_secondary<R>(body: impl FnOnce() -> R) -> R {
    READ_PREFERENCE.with_scope(ReadPreference::Secondary, body)
}

pub fn with_read_preference<R>(preference: ReadPreference, body: impl FnOnce() -> R) -> R {
    READ_PREFERENCE.with_scope(preference, body)
}

pub fn current_read_preference() -> Option<ReadPreference> {
    READ_PREFERENCE.current()
}

/// Adds the current preference to `options` under `"read"`, unless no
/// preference is active or the caller already set one explicitly.
///
/// A `null` or `false` `"read"` counts as unset and is overwritten.
pub fn merge_options(options: &mut Map<String, Value>) -> &mut Map<String, Value> {
    if let Some(preference) = current_read_preference() {
        let slot = options.entry(READ_KEY).or_insert(Value::Null);
        if matches!(slot, Value::Null | Value::Bool(false)) {
            *slot = Value::String(preference.into());
        }
    }
    options
}

impl<T: 'static> Dispatch<T> {
    /// Routes every call of the named operations with `preference`.
    pub fn read_preference(
        &mut self,
        preference: ReadPreference,
        names: &[&str],
    ) -> ContextResult<()> {
        self.wrap(names, READ_PREFERENCE, preference)
    }
}
