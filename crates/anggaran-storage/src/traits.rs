//! The [`ItemStore`] trait: the persistence contract the budget editor
//! consumes.
//!
//! Only the operations below cross the boundary between the tree engine and
//! the backing store. All backends (InMemoryStore, SqliteStore) implement this
//! trait, so the save executor and the HTTP service are backend-agnostic.

use anggaran_core::{ItemPayload, ItemRecord, ItemScope};

use crate::error::StorageError;
use crate::types::{Category, Period};

/// Storage contract for budget items and their catalogs.
///
/// The trait is synchronous; callers issue calls one after another in
/// dependency order.
pub trait ItemStore {
    // -------------------------------------------------------------------
    // Catalogs
    // -------------------------------------------------------------------

    /// Lists all categories, ordered by id.
    fn list_categories(&self) -> Result<Vec<Category>, StorageError>;

    /// Creates a category and returns it with its assigned id.
    fn create_category(&mut self, name: &str) -> Result<Category, StorageError>;

    /// Lists all periods, ordered by id.
    fn list_periods(&self) -> Result<Vec<Period>, StorageError>;

    /// Creates a period and returns it with its assigned id.
    fn create_period(&mut self, name: &str, year: i32) -> Result<Period, StorageError>;

    // -------------------------------------------------------------------
    // Budget items
    // -------------------------------------------------------------------

    /// All items of one category/period, flat, ordered by level then
    /// sibling order.
    fn list_items(&self, scope: ItemScope) -> Result<Vec<ItemRecord>, StorageError>;

    /// Retrieves one item by id.
    fn get_item(&self, id: i64) -> Result<ItemRecord, StorageError>;

    /// Inserts an item and returns it with its assigned id.
    ///
    /// The parent, when given, must exist in the same category/period.
    fn create_item(&mut self, payload: &ItemPayload) -> Result<ItemRecord, StorageError>;

    /// Overwrites an existing item.
    fn update_item(&mut self, id: i64, payload: &ItemPayload) -> Result<ItemRecord, StorageError>;

    /// Deletes an item together with all of its descendants.
    ///
    /// Returns [`StorageError::ItemNotFound`] when the item does not exist;
    /// callers that treat deletion as idempotent match on that.
    fn delete_item(&mut self, id: i64) -> Result<(), StorageError>;
}

/// Checks the parts of a payload that do not depend on the backend.
pub(crate) fn check_payload(payload: &ItemPayload) -> Result<(), StorageError> {
    if !(1..=anggaran_core::MAX_LEVEL).contains(&payload.level) {
        return Err(StorageError::IntegrityError {
            reason: format!("level {} is outside 1..={}", payload.level, anggaran_core::MAX_LEVEL),
        });
    }
    if payload.parent_id.is_none() && payload.level != 1 {
        return Err(StorageError::IntegrityError {
            reason: format!("top-level item '{}' must be at level 1", payload.code),
        });
    }
    if payload.name.trim().is_empty() {
        return Err(StorageError::IntegrityError {
            reason: format!("item '{}' has an empty name", payload.code),
        });
    }
    Ok(())
}

/// Checks a payload's parent against the parent's stored record.
pub(crate) fn check_parent(
    payload: &ItemPayload,
    parent: &ItemRecord,
    self_id: Option<i64>,
) -> Result<(), StorageError> {
    if Some(parent.id) == self_id {
        return Err(StorageError::IntegrityError {
            reason: format!("item {} cannot be its own parent", parent.id),
        });
    }
    if parent.payload.scope() != payload.scope() {
        return Err(StorageError::IntegrityError {
            reason: format!(
                "parent {} belongs to {}, not {}",
                parent.id,
                parent.payload.scope(),
                payload.scope()
            ),
        });
    }
    if parent.payload.level + 1 != payload.level {
        return Err(StorageError::IntegrityError {
            reason: format!(
                "item '{}' at level {} cannot sit under level {}",
                payload.code, payload.level, parent.payload.level
            ),
        });
    }
    Ok(())
}
