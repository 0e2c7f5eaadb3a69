//! Document model and change events for the PATCH-DOC protocol.
//!
//! A [`Document`] owns a graph of [`Model`]s reachable from its roots. Every
//! mutation raises a [`DocumentChangedEvent`] to registered listeners, and
//! events can be encoded into patch JSON and replayed onto another copy of
//! the document with [`Document::apply_json_patch`].

pub mod columns;
pub mod document;
pub mod error;
pub mod events;
pub mod ids;
pub mod model;
pub mod value;

pub use columns::{ColumnData, ColumnPatches, PatchIndex};
pub use document::{Document, ListenerId, DEFAULT_TITLE};
pub use error::{ColumnError, DocumentError};
pub use events::{
    coalesce, patch_json, ColumnDataChangedEvent, ColumnsHint, ColumnsPatchedEvent,
    ColumnsStreamedEvent, DocumentChangedEvent, ModelChangedEvent, RootAddedEvent,
    RootRemovedEvent, TitleChangedEvent,
};
pub use ids::{DocumentId, ModelId, Setter};
pub use model::Model;
pub use value::{ModelRef, PropValue};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
