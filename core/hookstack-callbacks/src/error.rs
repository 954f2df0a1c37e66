//! Error types for the callback engine.

use crate::phase::{CallbackKind, Phase, Timing};
use thiserror::Error;

/// Result type for callback operations.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Errors raised while defining or running callbacks.
///
/// A handler halting a phase is not an error; see
/// [`crate::PhaseOutcome::Halted`].
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The kind has no hook point at this timing (e.g. `before_initialize`).
    #[error("unsupported phase: {kind} has no {timing} callbacks")]
    UnsupportedPhase { kind: CallbackKind, timing: Timing },

    /// A phase name that does not parse.
    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    /// An around handler given for a before/after phase, or the reverse.
    #[error("{handler} handler cannot be registered for {phase}")]
    HandlerMismatch { phase: Phase, handler: &'static str },

    /// A document was reached again through its own cascading relations.
    #[error("cascade cycle: {model} {kind} reaches the same document through its own relations")]
    CascadeCycle { model: String, kind: CallbackKind },

    /// Malformed configuration file.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}
