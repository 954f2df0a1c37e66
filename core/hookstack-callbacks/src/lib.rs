//! Cascading lifecycle callbacks for Hookstack documents.
//!
//! - [`Phase`] — the sixteen hook points (`before_save`, `around_create`, ...)
//!   in their fixed order, built from a [`CallbackKind`] and a [`Timing`]
//! - [`CallbackRegistry`] — per-model handler chains, executed in
//!   registration order
//! - [`CascadeResolver`] — which embedded children a phase propagates to,
//!   and under which remapped kind
//! - [`CallbackRunner`] — runs a phase over a document tree: children first,
//!   strict short-circuit on the first failure, then the document's own chain
//!
//! A failed phase is reported as [`PhaseOutcome::Halted`], never as an error.
//! [`CallbackError`] is reserved for setup mistakes and structural faults such
//! as a cascade cycle.

mod cascade;
mod config;
mod error;
mod phase;
mod registry;
mod runner;

pub use cascade::{CascadeResolver, CascadeStep, Origin};
pub use config::{AroundPolicy, CallbackConfig};
pub use error::{CallbackError, CallbackResult};
pub use phase::{CallbackKind, Phase, Timing};
pub use registry::{AroundFn, CallbackRegistry, Flow, Handler, HookFn, Proceed};
pub use runner::{CallbackRunner, PhaseOutcome};
