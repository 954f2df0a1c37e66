//! Error types for scoped context and dispatch.

use crate::dispatch::{Access, Visibility};
use thiserror::Error;

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Result type for dispatch calls.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised by the scoped context stack and by declarative setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// Invalid declarative setup, reported at definition time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pop that does not match the innermost outstanding push.
    #[error("imbalanced scope on slot '{slot}': token expects depth {expected}, stack is at {actual}")]
    ImbalancedScope {
        slot: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised when calling an operation through a [`crate::Dispatch`] table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown operation '{operation}' on {type_name}")]
    UnknownOperation {
        type_name: &'static str,
        operation: String,
    },

    #[error("access denied: {visibility} operation '{operation}' called from {caller}")]
    AccessDenied {
        operation: String,
        visibility: Visibility,
        caller: Access,
    },
}
