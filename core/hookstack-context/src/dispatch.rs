//! Named-operation tables with declarative scoped overrides.
//!
//! A [`Dispatch`] maps operation names to implementations for one target
//! type. [`Dispatch::wrap`] replaces selected entries, at definition time,
//! with versions that run the original inside [`ContextSlot::with_scope`].
//! Each entry keeps the [`Visibility`] it was defined with, so wrapping never
//! widens or narrows who may call it.

use crate::error::{ContextError, ContextResult, DispatchError, DispatchResult};
use crate::slot::ContextSlot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Implementation of one named operation: receives the target and the
/// positional arguments.
pub type Operation<T> = Arc<dyn Fn(&T, &[Value]) -> Value + Send + Sync>;

/// Who may call an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Callable from anywhere.
    Public,
    /// Callable from the owning type and its subtypes.
    Protected,
    /// Callable from the owning type only.
    Private,
}

impl Visibility {
    /// Returns true if a call from `caller` is permitted.
    pub fn permits(&self, caller: Access) -> bool {
        match self {
            Self::Public => true,
            Self::Protected => matches!(caller, Access::Owner | Access::Subtype),
            Self::Private => matches!(caller, Access::Owner),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        })
    }
}

/// Where a call originates, relative to the type owning the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Code unrelated to the owning type.
    External,
    /// Code belonging to a subtype of the owning type.
    Subtype,
    /// Code belonging to the owning type itself.
    Owner,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::External => "external code",
            Self::Subtype => "a subtype",
            Self::Owner => "the owning type",
        })
    }
}

struct Method<T> {
    visibility: Visibility,
    op: Operation<T>,
}

impl<T> Clone for Method<T> {
    fn clone(&self) -> Self {
        Self {
            visibility: self.visibility,
            op: Arc::clone(&self.op),
        }
    }
}

/// Operation table for values of type `T`.
pub struct Dispatch<T> {
    type_name: &'static str,
    methods: HashMap<String, Method<T>>,
}

impl<T: 'static> Dispatch<T> {
    /// Creates an empty table. `type_name` is used in errors and logs.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            methods: HashMap::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Defines (or redefines) an operation.
    pub fn define<F>(&mut self, name: &str, visibility: Visibility, op: F) -> &mut Self
    where
        F: Fn(&T, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(
            name.to_string(),
            Method {
                visibility,
                op: Arc::new(op),
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn visibility(&self, name: &str) -> Option<Visibility> {
        self.methods.get(name).map(|m| m.visibility)
    }

    /// Calls `name` on `target` on behalf of `caller`.
    pub fn invoke(
        &self,
        target: &T,
        caller: Access,
        name: &str,
        args: &[Value],
    ) -> DispatchResult<Value> {
        let method = self
            .methods
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOperation {
                type_name: self.type_name,
                operation: name.to_string(),
            })?;
        if !method.visibility.permits(caller) {
            return Err(DispatchError::AccessDenied {
                operation: name.to_string(),
                visibility: method.visibility,
                caller,
            });
        }
        trace!(type_name = self.type_name, operation = name, "Dispatching operation");
        Ok((method.op)(target, args))
    }

    /// Rewrites each named operation so every call runs with `value` current
    /// in `slot`, returning whatever the original returns.
    ///
    /// All names are checked before anything is replaced: an empty list or an
    /// unknown name fails with [`ContextError::Configuration`] and leaves the
    /// table unchanged.
    pub fn wrap<V>(&mut self, names: &[&str], slot: ContextSlot<V>, value: V) -> ContextResult<()>
    where
        V: Clone + Send + Sync + 'static,
    {
        if names.is_empty() {
            return Err(ContextError::Configuration(format!(
                "no operations given to wrap on {} for slot '{}'",
                self.type_name,
                slot.name()
            )));
        }
        if let Some(missing) = names.iter().find(|name| !self.methods.contains_key(**name)) {
            return Err(ContextError::Configuration(format!(
                "cannot wrap undefined operation '{missing}' on {}",
                self.type_name
            )));
        }

        for name in names {
            let Some(method) = self.methods.get(*name).cloned() else {
                continue;
            };
            let original = method.op;
            let value = value.clone();
            let wrapped: Operation<T> = Arc::new(move |target: &T, args: &[Value]| {
                slot.with_scope(value.clone(), || original(target, args))
            });
            self.methods.insert(
                name.to_string(),
                Method {
                    visibility: method.visibility,
                    op: wrapped,
                },
            );
            debug!(
                type_name = self.type_name,
                operation = *name,
                slot = slot.name(),
                "Wrapped operation in scoped override"
            );
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Dispatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("Dispatch")
            .field("type_name", &self.type_name)
            .field("operations", &names)
            .finish()
    }
}
