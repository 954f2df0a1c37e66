//! Scoped ambient context for Hookstack.
//!
//! - [`ContextSlot`] — a typed, thread-local stack of override values with
//!   LIFO push/pop, RAII restoration ([`ScopeGuard`]) and the block form
//!   [`ContextSlot::with_scope`]
//! - [`Dispatch`] — a per-type table of named operations that can be wrapped
//!   so every call runs inside a fixed override, keeping each operation's
//!   [`Visibility`]
//! - [`ReadPreference`] — the data-source routing slot consumed by query
//!   option builders via [`merge_options`]
//!
//! Every thread has its own stacks. Nothing pushed on one thread is ever
//! visible on another.

mod dispatch;
mod error;
mod read_preference;
mod slot;

pub use dispatch::{Access, Dispatch, Operation, Visibility};
pub use error::{ContextError, ContextResult, DispatchError, DispatchResult};
pub use read_preference::{
    READ_PREFERENCE, ReadPreference, current_read_preference, merge_options, with_primary,
    with_read_preference, with_secondary,
};
pub use slot::{ContextSlot, ScopeGuard, ScopeToken};
