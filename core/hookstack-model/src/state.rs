use serde::{Deserialize, Serialize};

/// Persistence state of a document, as tracked by the owning application.
///
/// The callback engine only reads this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    /// Never persisted.
    #[default]
    New,
    /// Persisted and unchanged since the last write.
    Persisted,
    /// Persisted with unsaved changes.
    Modified,
    /// Marked for removal by its parent.
    FlaggedForRemoval,
}

impl DocumentState {
    /// Returns true if the document has never been persisted.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    /// Returns true if there is something to write: the document is new or modified.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::New | Self::Modified)
    }

    /// Returns true if the parent flagged the document for removal.
    pub fn is_flagged_for_removal(&self) -> bool {
        matches!(self, Self::FlaggedForRemoval)
    }
}
