use crate::error::{CallbackError, CallbackResult};
use crate::phase::{CallbackKind, Phase, Timing};
use hookstack_model::Cascadable;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// What a handler tells the chain to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop the chain; the phase reports failure.
    Halt,
}

/// Continuation handed to an around handler.
///
/// Runs the rest of the chain (inner around handlers, then the action) and
/// reports whether it succeeded. Consumed by value, so it runs at most once.
pub struct Proceed<'a> {
    next: &'a mut dyn FnMut() -> bool,
}

impl<'a> Proceed<'a> {
    pub(crate) fn new(next: &'a mut dyn FnMut() -> bool) -> Self {
        Self { next }
    }

    pub fn proceed(self) -> bool {
        (self.next)()
    }
}

/// A before or after handler.
pub type HookFn = Arc<dyn Fn(&dyn Cascadable) -> Flow + Send + Sync>;

/// An around handler.
pub type AroundFn = Arc<dyn Fn(&dyn Cascadable, Proceed<'_>) -> Flow + Send + Sync>;

/// A registered callback.
#[derive(Clone)]
pub enum Handler {
    Hook(HookFn),
    Around(AroundFn),
}

impl Handler {
    pub fn hook<F>(f: F) -> Self
    where
        F: Fn(&dyn Cascadable) -> Flow + Send + Sync + 'static,
    {
        Self::Hook(Arc::new(f))
    }

    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&dyn Cascadable, Proceed<'_>) -> Flow + Send + Sync + 'static,
    {
        Self::Around(Arc::new(f))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Hook(_) => "hook",
            Self::Around(_) => "around",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Default)]
struct ModelCallbacks {
    hooks: HashMap<Phase, Vec<HookFn>>,
    arounds: HashMap<CallbackKind, Vec<AroundFn>>,
}

/// Handler chains per model and phase.
///
/// Registration order is execution order. The registry is populated at setup
/// time and then shared read-only, typically behind an `Arc`.
#[derive(Default)]
pub struct CallbackRegistry {
    models: HashMap<String, ModelCallbacks>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to `model`'s chain for `phase`.
    ///
    /// Around phases take [`Handler::Around`], the rest take [`Handler::Hook`].
    pub fn define(&mut self, model: &str, phase: Phase, handler: Handler) -> CallbackResult<()> {
        let callbacks = self.models.entry(model.to_string()).or_default();
        match (phase.timing(), handler) {
            (Timing::Around, Handler::Around(f)) => {
                callbacks.arounds.entry(phase.kind()).or_default().push(f);
            }
            (Timing::Before | Timing::After, Handler::Hook(f)) => {
                callbacks.hooks.entry(phase).or_default().push(f);
            }
            (_, handler) => {
                return Err(CallbackError::HandlerMismatch {
                    phase,
                    handler: handler.label(),
                });
            }
        }
        trace!(model = %model, phase = %phase, "callback defined");
        Ok(())
    }

    pub fn before<F>(&mut self, model: &str, kind: CallbackKind, f: F) -> CallbackResult<()>
    where
        F: Fn(&dyn Cascadable) -> Flow + Send + Sync + 'static,
    {
        let phase = Phase::new(Timing::Before, kind)?;
        self.define(model, phase, Handler::hook(f))
    }

    pub fn after<F>(&mut self, model: &str, kind: CallbackKind, f: F) -> CallbackResult<()>
    where
        F: Fn(&dyn Cascadable) -> Flow + Send + Sync + 'static,
    {
        let phase = Phase::new(Timing::After, kind)?;
        self.define(model, phase, Handler::hook(f))
    }

    pub fn around<F>(&mut self, model: &str, kind: CallbackKind, f: F) -> CallbackResult<()>
    where
        F: Fn(&dyn Cascadable, Proceed<'_>) -> Flow + Send + Sync + 'static,
    {
        let phase = Phase::new(Timing::Around, kind)?;
        self.define(model, phase, Handler::around(f))
    }

    /// Handlers for one phase, in registration order.
    pub fn handlers_for(&self, model: &str, phase: Phase) -> Vec<Handler> {
        let Some(callbacks) = self.models.get(model) else {
            return Vec::new();
        };
        match phase.timing() {
            Timing::Around => callbacks
                .arounds
                .get(&phase.kind())
                .map(|fs| fs.iter().cloned().map(Handler::Around).collect())
                .unwrap_or_default(),
            Timing::Before | Timing::After => callbacks
                .hooks
                .get(&phase)
                .map(|fs| fs.iter().cloned().map(Handler::Hook).collect())
                .unwrap_or_default(),
        }
    }

    /// Whether `model` has any handler for `kind`, at any timing.
    pub fn has_phase(&self, model: &str, kind: CallbackKind) -> bool {
        self.models.get(model).is_some_and(|callbacks| {
            callbacks.arounds.get(&kind).is_some_and(|fs| !fs.is_empty())
                || callbacks
                    .hooks
                    .iter()
                    .any(|(phase, fs)| phase.kind() == kind && !fs.is_empty())
        })
    }

    pub(crate) fn hooks(&self, model: &str, phase: Phase) -> &[HookFn] {
        self.models
            .get(model)
            .and_then(|c| c.hooks.get(&phase))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn arounds(&self, model: &str, kind: CallbackKind) -> &[AroundFn] {
        self.models
            .get(model)
            .and_then(|c| c.arounds.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut models: Vec<&String> = self.models.keys().collect();
        models.sort();
        f.debug_struct("CallbackRegistry")
            .field("models", &models)
            .finish()
    }
}
