//! Which embedded children a phase propagates to.
//!
//! Relations are walked in declaration order; relations not marked as
//! cascading are skipped entirely. Within a relation, children pulled out of
//! the live collection (pending removals) come first, in the order they were
//! recorded, and always run `destroy`. Live children follow.
//!
//! A live child is *eligible* when the phase has to run on it:
//!
//! | parent kind           | eligible when                                |
//! |-----------------------|----------------------------------------------|
//! | initialize            | never (initialization does not cascade)      |
//! | create, destroy       | always                                       |
//! | anything else         | the child is new, modified or flagged        |
//!
//! Under `update` an eligible child is remapped by state: new children run
//! `create`, flagged children run `destroy`, the rest keep `update`.
//! Non-eligible children are still descended into with the parent's kind, so
//! a modified grandchild below an untouched child is reached.

use crate::error::{CallbackError, CallbackResult};
use crate::phase::CallbackKind;
use hookstack_model::{Cascadable, DocumentState, EntityAddr, entity_addr};
use std::fmt;
use tracing::debug;

/// Where a cascade step's child was found.
#[derive(Clone, Copy)]
pub enum Origin<'a> {
    /// Currently reachable through the relation.
    Live,
    /// Detached from `owner`'s `relation` and awaiting its destroy run.
    Pending {
        owner: &'a dyn Cascadable,
        relation: &'a str,
    },
}

impl Origin<'_> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

impl fmt::Debug for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("Live"),
            Self::Pending { owner, relation } => f
                .debug_struct("Pending")
                .field("owner", &owner.model_name())
                .field("relation", relation)
                .finish(),
        }
    }
}

/// One child reached by a cascade.
#[derive(Clone, Copy)]
pub struct CascadeStep<'a> {
    pub child: &'a dyn Cascadable,
    /// The kind to run on the child: remapped when eligible, the parent's
    /// kind otherwise.
    pub kind: CallbackKind,
    /// Whether the child's own handlers run.
    pub eligible: bool,
    pub origin: Origin<'a>,
}

impl fmt::Debug for CascadeStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeStep")
            .field("child", &self.child.model_name())
            .field("kind", &self.kind)
            .field("eligible", &self.eligible)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Resolves cascade steps for a document.
#[derive(Debug, Clone, Copy)]
pub struct CascadeResolver {
    detect_cycles: bool,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeResolver {
    pub fn new() -> Self {
        Self {
            detect_cycles: true,
        }
    }

    /// Turns ancestry tracking on or off for [`Self::children_for`].
    #[must_use]
    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }

    pub fn detects_cycles(&self) -> bool {
        self.detect_cycles
    }

    /// Steps for the immediate children of `entity`, eligible or not.
    pub fn direct_steps<'a>(
        &self,
        entity: &'a dyn Cascadable,
        kind: CallbackKind,
    ) -> Vec<CascadeStep<'a>> {
        if kind == CallbackKind::Initialize {
            return Vec::new();
        }

        let mut steps = Vec::new();
        for relation in entity.relations() {
            if !relation.cascading {
                continue;
            }
            let name = relation.name.as_str();

            for child in entity.pending_removals().for_relation(name) {
                steps.push(CascadeStep {
                    child,
                    kind: CallbackKind::Destroy,
                    eligible: true,
                    origin: Origin::Pending {
                        owner: entity,
                        relation: name,
                    },
                });
            }

            for child in entity.related(name) {
                let state = child.state();
                let eligible = is_eligible(kind, state);
                steps.push(CascadeStep {
                    child,
                    kind: if eligible { remap(kind, state) } else { kind },
                    eligible,
                    origin: Origin::Live,
                });
            }
        }

        debug!(
            model = %entity.model_name(),
            kind = %kind,
            steps = steps.len(),
            "resolved cascade"
        );
        steps
    }

    /// Every eligible descendant of `entity` for `kind`, flattened in
    /// pre-order: each child before its own descendants.
    ///
    /// Eligible children are expanded under their remapped kind, pending
    /// removals under `destroy`.
    pub fn children_for<'a>(
        &self,
        entity: &'a dyn Cascadable,
        kind: CallbackKind,
    ) -> CallbackResult<Vec<CascadeStep<'a>>> {
        let mut steps = Vec::new();
        let mut path = vec![entity_addr(entity)];
        self.collect(entity, kind, &mut path, &mut steps)?;
        Ok(steps)
    }

    fn collect<'a>(
        &self,
        entity: &'a dyn Cascadable,
        kind: CallbackKind,
        path: &mut Vec<EntityAddr>,
        out: &mut Vec<CascadeStep<'a>>,
    ) -> CallbackResult<()> {
        for step in self.direct_steps(entity, kind) {
            self.enter(step, path)?;
            if step.eligible {
                out.push(step);
            }
            self.collect(step.child, step.kind, path, out)?;
            path.pop();
        }
        Ok(())
    }

    /// Pushes `step`'s child onto the ancestry path, failing if it is
    /// already there.
    pub(crate) fn enter(&self, step: CascadeStep<'_>, path: &mut Vec<EntityAddr>) -> CallbackResult<()> {
        let addr = entity_addr(step.child);
        if self.detect_cycles && path.contains(&addr) {
            return Err(CallbackError::CascadeCycle {
                model: step.child.model_name().to_string(),
                kind: step.kind,
            });
        }
        path.push(addr);
        Ok(())
    }
}

fn is_eligible(kind: CallbackKind, state: DocumentState) -> bool {
    match kind {
        CallbackKind::Initialize => false,
        CallbackKind::Create | CallbackKind::Destroy => true,
        _ => state.is_changed() || state.is_flagged_for_removal(),
    }
}

fn remap(kind: CallbackKind, state: DocumentState) -> CallbackKind {
    if kind != CallbackKind::Update {
        return kind;
    }
    if state.is_new() {
        CallbackKind::Create
    } else if state.is_flagged_for_removal() {
        CallbackKind::Destroy
    } else {
        CallbackKind::Update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_remaps_by_state() {
        assert_eq!(remap(CallbackKind::Update, DocumentState::New), CallbackKind::Create);
        assert_eq!(
            remap(CallbackKind::Update, DocumentState::FlaggedForRemoval),
            CallbackKind::Destroy
        );
        assert_eq!(remap(CallbackKind::Update, DocumentState::Modified), CallbackKind::Update);
    }

    #[test]
    fn other_kinds_are_never_remapped() {
        for state in [
            DocumentState::New,
            DocumentState::Persisted,
            DocumentState::Modified,
            DocumentState::FlaggedForRemoval,
        ] {
            assert_eq!(remap(CallbackKind::Save, state), CallbackKind::Save);
            assert_eq!(remap(CallbackKind::Create, state), CallbackKind::Create);
        }
    }

    #[test]
    fn persisted_children_only_cascade_create_and_destroy() {
        let state = DocumentState::Persisted;
        assert!(is_eligible(CallbackKind::Create, state));
        assert!(is_eligible(CallbackKind::Destroy, state));
        assert!(!is_eligible(CallbackKind::Save, state));
        assert!(!is_eligible(CallbackKind::Validation, state));
        assert!(!is_eligible(CallbackKind::Update, state));
        assert!(!is_eligible(CallbackKind::Initialize, DocumentState::New));
    }
}
