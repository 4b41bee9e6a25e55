//! Persistence for anggaran budget trees.
//!
//! Provides the [`ItemStore`] trait (the narrow list/create/update/delete
//! contract the editor consumes), the [`InMemoryStore`] and [`SqliteStore`]
//! backends, and the save executor that applies a planned save to a store.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: Category and Period catalog types
//! - [`traits`]: ItemStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: SQL schema and migration setup
//! - [`sqlite`]: SqliteStore implementation
//! - [`save`]: plan execution, reload and immediate deletion

pub mod error;
pub mod memory;
pub mod save;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use save::{
    delete_immediately, execute_plan, load_tree, save_tree, Deleted, LoadedTree, SaveError,
    SaveOutcome, SaveReport,
};
pub use sqlite::SqliteStore;
pub use traits::ItemStore;
pub use types::{Category, Period};
