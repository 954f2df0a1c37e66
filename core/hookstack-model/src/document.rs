use crate::{Cascadable, DocumentState, PendingRemovals, RelationKind, RelationMetadata};
use std::collections::HashMap;
use uuid::Uuid;

/// A generic embedded document.
///
/// Carries a JSON payload and any number of declared relations holding child
/// documents. The `data` field holds arbitrary JSON whose structure is up to
/// the application; the callback engine only looks at state and relations.
#[derive(Debug)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
    model: String,
    state: DocumentState,
    relations: Vec<RelationMetadata>,
    members: HashMap<String, Vec<Document>>,
    pending: PendingRemovals,
}

impl Document {
    /// Creates a new, unsaved document of the given model with an empty payload.
    pub fn new(model: &str) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            data: serde_json::Value::Object(serde_json::Map::new()),
            model: model.to_string(),
            state: DocumentState::New,
            relations: Vec::new(),
            members: HashMap::new(),
            pending: PendingRemovals::new(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: DocumentState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// Declares a relation. Redeclaring an existing name replaces its metadata
    /// and keeps its children.
    #[must_use]
    pub fn embed(mut self, metadata: RelationMetadata) -> Self {
        match self.relations.iter_mut().find(|r| r.name == metadata.name) {
            Some(existing) => *existing = metadata,
            None => {
                self.members.insert(metadata.name.clone(), Vec::new());
                self.relations.push(metadata);
            }
        }
        self
    }

    /// Builder form of [`Document::push`].
    #[must_use]
    pub fn with_child(mut self, relation: &str, child: Document) -> Self {
        self.push(relation, child);
        self
    }

    pub fn set_state(&mut self, state: DocumentState) {
        self.state = state;
    }

    /// Adds a child to a declared relation. A single-child relation has its
    /// current child replaced. Returns false if the relation is not declared.
    pub fn push(&mut self, relation: &str, child: Document) -> bool {
        let Some(kind) = self.relation_kind(relation) else {
            return false;
        };
        let Some(children) = self.members.get_mut(relation) else {
            return false;
        };
        if kind == RelationKind::One {
            children.clear();
        }
        children.push(child);
        true
    }

    /// Detaches the child at `index`, flags it for removal, and records it as
    /// a pending removal so it still receives a destroy run.
    ///
    /// Returns false if there is no such child.
    pub fn pull(&mut self, relation: &str, index: usize) -> bool {
        let Some(children) = self.members.get_mut(relation) else {
            return false;
        };
        if index >= children.len() {
            return false;
        }
        let mut child = children.remove(index);
        child.state = DocumentState::FlaggedForRemoval;
        self.pending.record(relation, Box::new(child));
        true
    }

    /// Drops pending removals that have already been released, here and in
    /// every embedded child. Returns how many were dropped.
    pub fn purge_removals(&mut self) -> usize {
        let mut dropped = self.pending.purge();
        for children in self.members.values_mut() {
            dropped += children.iter_mut().map(Document::purge_removals).sum::<usize>();
        }
        dropped
    }

    /// Live children of a relation.
    pub fn children(&self, relation: &str) -> &[Document] {
        self.members.get(relation).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn child(&self, relation: &str, index: usize) -> Option<&Document> {
        self.members.get(relation).and_then(|c| c.get(index))
    }

    pub fn child_mut(&mut self, relation: &str, index: usize) -> Option<&mut Document> {
        self.members.get_mut(relation).and_then(|c| c.get_mut(index))
    }

    /// Extract a string value from `data` using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.data.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean value from `data` using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.data.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric value from `data` using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.data.pointer(pointer).and_then(|v| v.as_f64())
    }

    fn relation_kind(&self, relation: &str) -> Option<RelationKind> {
        self.relations.iter().find(|r| r.name == relation).map(|r| r.kind)
    }
}

impl Cascadable for Document {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn state(&self) -> DocumentState {
        self.state
    }

    fn relations(&self) -> &[RelationMetadata] {
        &self.relations
    }

    fn related(&self, relation: &str) -> Vec<&dyn Cascadable> {
        self.children(relation)
            .iter()
            .map(|c| c as &dyn Cascadable)
            .collect()
    }

    fn pending_removals(&self) -> &PendingRemovals {
        &self.pending
    }
}
