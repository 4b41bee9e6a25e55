//! Storage error types for anggaran-storage.
//!
//! [`StorageError`] covers the failure modes of the persistence collaborator:
//! database and migration failures, missing rows per entity, and integrity
//! violations in create/update payloads.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite returned an error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// A budget item with the given id was not found.
    #[error("item not found: {0}")]
    ItemNotFound(i64),

    /// A category with the given id was not found.
    #[error("category not found: {0}")]
    CategoryNotFound(i64),

    /// A period with the given id was not found.
    #[error("period not found: {0}")]
    PeriodNotFound(i64),

    /// A payload violates a structural rule (bad parent, level, scope).
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}

impl StorageError {
    /// True for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ItemNotFound(_)
                | StorageError::CategoryNotFound(_)
                | StorageError::PeriodNotFound(_)
        )
    }
}
