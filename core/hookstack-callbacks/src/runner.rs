use crate::cascade::{CascadeResolver, Origin};
use crate::config::{AroundPolicy, CallbackConfig};
use crate::error::CallbackResult;
use crate::phase::{CallbackKind, Phase, Timing};
use crate::registry::{AroundFn, CallbackRegistry, Flow, HookFn, Proceed};
use hookstack_model::{Cascadable, EntityAddr, entity_addr};
use std::sync::Arc;
use tracing::{debug, warn};

/// How a phase run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The document's own handler chain ran to the end.
    Completed,
    /// Every child succeeded and the document has no handlers for the phase.
    /// The action was not run.
    PassedThrough,
    /// A handler, an around that never yielded, the action, or a child
    /// reported failure.
    Halted,
}

impl PhaseOutcome {
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Halted)
    }
}

/// Runs lifecycle phases over document trees.
///
/// Children run before the document itself and the first failing child
/// stops the run. Siblings after it are not visited.
pub struct CallbackRunner {
    registry: Arc<CallbackRegistry>,
    resolver: CascadeResolver,
    config: CallbackConfig,
}

impl CallbackRunner {
    pub fn new(registry: Arc<CallbackRegistry>) -> Self {
        Self::with_config(registry, CallbackConfig::default())
    }

    pub fn with_config(registry: Arc<CallbackRegistry>, config: CallbackConfig) -> Self {
        Self {
            registry,
            resolver: CascadeResolver::new().with_cycle_detection(config.detect_cycles),
            config,
        }
    }

    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CallbackConfig {
        &self.config
    }

    /// Runs `kind` on `entity` and its cascade.
    ///
    /// `action` is threaded through the document's own chain and runs inside
    /// its around handlers. On [`PhaseOutcome::PassedThrough`] it has not run;
    /// the caller runs it, or uses [`Self::perform`].
    pub fn run<F>(
        &self,
        entity: &dyn Cascadable,
        kind: CallbackKind,
        action: F,
    ) -> CallbackResult<PhaseOutcome>
    where
        F: FnOnce() -> bool,
    {
        let mut action = Some(action);
        let mut path = vec![entity_addr(entity)];
        self.run_node(entity, kind, true, &mut path, &mut || {
            action.take().is_some_and(|f| f())
        })
    }

    /// Runs `kind` and makes sure `action` runs exactly once if the phase
    /// gets that far. Returns whether the phase succeeded.
    pub fn perform<F>(
        &self,
        entity: &dyn Cascadable,
        kind: CallbackKind,
        action: F,
    ) -> CallbackResult<bool>
    where
        F: FnOnce() -> bool,
    {
        let mut action = Some(action);
        let outcome = self.run(entity, kind, || action.take().is_some_and(|f| f()))?;
        Ok(match outcome {
            PhaseOutcome::Completed => true,
            PhaseOutcome::Halted => false,
            PhaseOutcome::PassedThrough => action.take().is_some_and(|f| f()),
        })
    }

    fn run_node(
        &self,
        entity: &dyn Cascadable,
        kind: CallbackKind,
        run_own: bool,
        path: &mut Vec<EntityAddr>,
        action: &mut dyn FnMut() -> bool,
    ) -> CallbackResult<PhaseOutcome> {
        let model = entity.model_name();
        debug!(model = %model, kind = %kind, run_own, "running phase");

        for step in self.resolver.direct_steps(entity, kind) {
            self.resolver.enter(step, path)?;
            let outcome = self.run_node(step.child, step.kind, step.eligible, path, &mut || true);
            path.pop();

            if !outcome?.succeeded() {
                warn!(
                    model = %model,
                    child = %step.child.model_name(),
                    kind = %step.kind,
                    "cascade halted by child"
                );
                return Ok(PhaseOutcome::Halted);
            }
            if let Origin::Pending { owner, relation } = step.origin
                && persists_removals(kind)
            {
                owner.pending_removals().release(relation, step.child);
            }
        }

        if !run_own || !self.registry.has_phase(model, kind) {
            debug!(model = %model, kind = %kind, "phase passed through");
            return Ok(PhaseOutcome::PassedThrough);
        }

        if self.run_chain(entity, kind, action) {
            Ok(PhaseOutcome::Completed)
        } else {
            Ok(PhaseOutcome::Halted)
        }
    }

    fn run_chain(
        &self,
        entity: &dyn Cascadable,
        kind: CallbackKind,
        action: &mut dyn FnMut() -> bool,
    ) -> bool {
        let model = entity.model_name();

        if !self.run_hooks(entity, kind, Timing::Before) {
            return false;
        }
        if !self.run_arounds(entity, kind, self.registry.arounds(model, kind), action) {
            return false;
        }
        self.run_hooks(entity, kind, Timing::After)
    }

    fn run_hooks(&self, entity: &dyn Cascadable, kind: CallbackKind, timing: Timing) -> bool {
        let Ok(phase) = Phase::new(timing, kind) else {
            return true;
        };
        let hooks: &[HookFn] = self.registry.hooks(entity.model_name(), phase);
        for (index, hook) in hooks.iter().enumerate() {
            if hook(entity) == Flow::Halt {
                warn!(model = %entity.model_name(), phase = %phase, index, "callback halted");
                return false;
            }
        }
        true
    }

    /// Runs `arounds` nested, first outermost. The innermost continuation
    /// runs `action`.
    fn run_arounds(
        &self,
        entity: &dyn Cascadable,
        kind: CallbackKind,
        arounds: &[AroundFn],
        action: &mut dyn FnMut() -> bool,
    ) -> bool {
        let Some((outer, inner)) = arounds.split_first() else {
            let done = action();
            if !done {
                warn!(model = %entity.model_name(), kind = %kind, "action failed");
            }
            return done;
        };

        let mut yielded = false;
        let mut inner_ok = false;
        let flow = {
            let mut next = || {
                yielded = true;
                inner_ok = self.run_arounds(entity, kind, inner, &mut *action);
                inner_ok
            };
            outer(entity, Proceed::new(&mut next))
        };

        if !yielded {
            warn!(model = %entity.model_name(), kind = %kind, "around callback did not yield");
            return match self.config.unyielded_around {
                AroundPolicy::Halt => false,
                AroundPolicy::Continue => flow == Flow::Continue,
            };
        }
        if flow == Flow::Halt {
            warn!(model = %entity.model_name(), kind = %kind, "around callback halted");
            return false;
        }
        inner_ok
    }
}

/// Phases that write a detached child's removal. Pending removals stay
/// recorded through any other phase and are released only here.
fn persists_removals(kind: CallbackKind) -> bool {
    matches!(kind, CallbackKind::Update | CallbackKind::Destroy)
}
