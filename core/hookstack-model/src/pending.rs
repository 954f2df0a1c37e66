use crate::{Cascadable, EntityAddr, entity_addr};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

/// Per-relation lists of children that were detached from a live collection
/// but still owe a destroy phase run.
///
/// Owned by the parent document and populated by mutation code when a child
/// is pulled out of a relation. The callback engine releases a child once its
/// destroy phase has run; released children are no longer reported and are
/// dropped by the next [`PendingRemovals::purge`]. Releasing only needs a
/// shared reference, so the set is confined to one thread.
#[derive(Default)]
pub struct PendingRemovals {
    entries: Vec<(String, Vec<Box<dyn Cascadable>>)>,
    released: RefCell<HashSet<EntityAddr>>,
}

impl PendingRemovals {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a detached child for `relation`, after any already recorded.
    pub fn record(&mut self, relation: &str, child: Box<dyn Cascadable>) {
        match self.entries.iter_mut().find(|(name, _)| name == relation) {
            Some((_, children)) => children.push(child),
            None => self.entries.push((relation.to_string(), vec![child])),
        }
    }

    /// Unreleased children for `relation`, in the order they were recorded.
    pub fn for_relation(&self, relation: &str) -> Vec<&dyn Cascadable> {
        let released = self.released.borrow();
        let pending: Vec<&dyn Cascadable> = self
            .entries
            .iter()
            .filter(|(name, _)| name == relation)
            .flat_map(|(_, children)| children.iter())
            .map(|child| -> &dyn Cascadable { &**child })
            .filter(|child| !released.contains(&entity_addr(*child)))
            .collect();
        pending
    }

    /// Marks one child of `relation` as done. Returns false if it is not
    /// pending there or was already released.
    pub fn release(&self, relation: &str, child: &dyn Cascadable) -> bool {
        let addr = entity_addr(child);
        let known = self
            .entries
            .iter()
            .filter(|(name, _)| name == relation)
            .flat_map(|(_, children)| children.iter())
            .any(|c| entity_addr(&**c) == addr);
        known && self.released.borrow_mut().insert(addr)
    }

    /// Drops released children. Returns how many were dropped.
    pub fn purge(&mut self) -> usize {
        let released = self.released.get_mut();
        let mut dropped = 0;
        for (_, children) in &mut self.entries {
            let before = children.len();
            children.retain(|c| !released.contains(&entity_addr(&**c)));
            dropped += before - children.len();
        }
        self.entries.retain(|(_, children)| !children.is_empty());
        released.clear();
        dropped
    }

    /// Drops every child recorded for `relation`, released or not.
    pub fn clear(&mut self, relation: &str) {
        let released = self.released.get_mut();
        for (_, children) in self.entries.iter().filter(|(name, _)| name == relation) {
            for child in children {
                released.remove(&entity_addr(&**child));
            }
        }
        self.entries.retain(|(name, _)| name != relation);
    }

    /// Number of unreleased children across all relations.
    pub fn len(&self) -> usize {
        let recorded: usize = self.entries.iter().map(|(_, c)| c.len()).sum();
        recorded - self.released.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PendingRemovals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, _)| (name, self.for_relation(name).len())),
            )
            .finish()
    }
}
