//! Document model for Hookstack.
//!
//! Defines the types the callback engine traverses:
//! - [`Cascadable`] — the capability every document type implements so that
//!   lifecycle phases can walk its embedded relations
//! - [`DocumentState`] — new / persisted / modified / flagged-for-removal
//! - [`RelationMetadata`] — one embedded relation and whether callbacks cascade across it
//! - [`PendingRemovals`] — children pulled out of a relation that still owe a destroy run
//! - [`Document`] — a generic embedded-document node implementing [`Cascadable`]
//!
//! The callback engine never constructs or destroys documents. It only reads
//! these types, so persistence code is free to supply its own [`Cascadable`]
//! implementations.

mod cascadable;
mod document;
mod pending;
mod relation;
mod state;

pub use cascadable::{Cascadable, EntityAddr, entity_addr};
pub use document::Document;
pub use pending::PendingRemovals;
pub use relation::{RelationKind, RelationMetadata};
pub use state::DocumentState;
