use serde::{Deserialize, Serialize};

/// Describes one embedded relation of a document type.
///
/// Declared alongside the document type and treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub name: String,
    pub kind: RelationKind,
    /// Whether lifecycle phases propagate across this relation.
    #[serde(default)]
    pub cascading: bool,
}

impl RelationMetadata {
    fn simple(name: &str, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cascading: false,
        }
    }

    /// Shorthand for a relation holding at most one child.
    pub fn embeds_one(name: &str) -> Self {
        Self::simple(name, RelationKind::One)
    }

    /// Shorthand for a relation holding an ordered collection of children.
    pub fn embeds_many(name: &str) -> Self {
        Self::simple(name, RelationKind::Many)
    }

    /// Sets whether callbacks cascade across this relation.
    #[must_use]
    pub fn cascade_callbacks(mut self, cascading: bool) -> Self {
        self.cascading = cascading;
        self
    }
}

/// Cardinality of an embedded relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    One,
    Many,
}
