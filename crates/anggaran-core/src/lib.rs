//! Hierarchical budget item (anggaran) tree engine.
//!
//! Pure, synchronous transformations over an in-memory tree of financial line
//! items: building from flat records, code generation, rollup of targets,
//! structural edits, the deletion policy and save planning. No I/O lives
//! here; the store and the save executor are in `anggaran-storage`.

pub mod code;
pub mod deletion;
pub mod error;
pub mod id;
pub mod item;
pub mod mutate;
pub mod record;
pub mod reconcile;
pub mod rollup;
pub mod tree;

// Re-export commonly used types
pub use code::{generate_code, regenerate_codes};
pub use deletion::{DeferredDeletions, DeletionMode, DeletionPrompt};
pub use error::CoreError;
pub use id::{CategoryId, ItemId, ItemScope, ParseItemIdError, PeriodId};
pub use item::{BudgetItem, ItemField, NumericInput, MAX_LEVEL};
pub use record::{ItemPayload, ItemRecord};
pub use reconcile::{plan_save, Baseline, ParentRef, SaveOp, SavePlan, SaveTask};
pub use rollup::{audit, recalculate, TreeIssue};
pub use tree::{build_tree, build_tree_checked, flatten, BudgetTree, BuildOutcome};
