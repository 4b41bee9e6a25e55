//! Core error types for anggaran-core.
//!
//! Every variant is a local, recoverable rejection detected before any call
//! reaches the persistence layer. Messages are user-facing.

use crate::id::ItemId;
use thiserror::Error;

/// Errors produced by tree edits, deletion decisions and save planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No item with this id exists in the tree.
    #[error("item not found: {id}")]
    ItemNotFound { id: ItemId },

    /// The tree must always keep at least one root item.
    #[error("cannot delete '{code}': at least one top-level item must remain")]
    LastRoot { code: String },

    /// Items cannot be nested below the deepest level.
    #[error("cannot add a child under '{code}': level {level} is the deepest level")]
    MaxDepthExceeded { code: String, level: u8 },

    /// A sibling insert named a level the anchor item does not sit at.
    #[error("item '{code}' is at level {found}, not level {expected}")]
    LevelMismatch { code: String, expected: u8, found: u8 },

    /// A visible item has an empty name.
    #[error("item '{code}' needs a name")]
    MissingName { code: String },

    /// The operation needs a store id but the item was never saved.
    #[error("item '{code}' has not been saved yet")]
    NotPersisted { code: String },

    /// A saved item must go through mark-for-deletion or delete-now.
    #[error("item '{code}' is saved: mark it for deletion or delete it now")]
    DeletionChoiceRequired { code: String },

    /// The item is marked for deletion and cannot be edited until unmarked.
    #[error("item '{code}' is marked for deletion")]
    ItemMarked { code: String },

    /// The item sits under an ancestor that is still marked for deletion.
    #[error("item '{code}' is inside '{ancestor}', which is marked for deletion")]
    AncestorMarked { code: String, ancestor: String },
}
