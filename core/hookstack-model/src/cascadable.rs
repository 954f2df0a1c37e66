use crate::{DocumentState, PendingRemovals, RelationMetadata};

/// Capability implemented by every document type that takes part in
/// lifecycle callbacks.
///
/// Implementors expose their relations explicitly so the callback engine
/// can walk the ownership tree without knowing the concrete type.
/// Cascading relations are expected to form a tree; the engine reports a
/// cycle instead of recursing forever. Instances are identified by
/// [`entity_addr`], so implementors must not be zero-sized.
pub trait Cascadable {
    /// Name of the document type. Callback handlers are registered per model name.
    fn model_name(&self) -> &str;

    /// Current persistence state.
    fn state(&self) -> DocumentState;

    /// Declared relations, in declaration order.
    fn relations(&self) -> &[RelationMetadata];

    /// Live children currently held by `relation`, in collection order.
    ///
    /// Unknown relation names and empty relations yield an empty list.
    fn related(&self, relation: &str) -> Vec<&dyn Cascadable>;

    /// Children detached from a relation that still owe a destroy run.
    fn pending_removals(&self) -> &PendingRemovals;
}

/// Identity of a document instance: its data address and its size.
pub type EntityAddr = (usize, usize);

/// Identity of a document instance, used to detect cycles along a cascade
/// path and to track released pending removals.
///
/// Pairing the address with the value's size keeps a child stored at offset
/// zero of its parent distinct from the parent. Zero-sized implementors
/// cannot be told apart this way; give such types at least one field.
pub fn entity_addr(entity: &dyn Cascadable) -> EntityAddr {
    (
        std::ptr::from_ref(entity).cast::<()>() as usize,
        std::mem::size_of_val(entity),
    )
}
