//! Editor session request/response types.
//!
//! A session holds one category/period tree in server memory. Clients send
//! [`Edit`]s one at a time and get the whole resulting tree back, since any
//! edit may renumber codes and change ancestor totals.

use anggaran_core::{BudgetItem, CategoryId, DeferredDeletions, ItemField, ItemId, PeriodId};
use anggaran_storage::SaveReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to open an editor on a category/period.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSessionRequest {
    pub category_id: CategoryId,
    pub period_id: PeriodId,
}

/// A single editor operation.
///
/// Item ids use the tagged form, `{"temporary": 3}` or `{"persistent": 17}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Edit {
    /// Append a new child under `parent`.
    AddChild { parent: ItemId },
    /// Insert a new item right after `after`, on `level`.
    AddSibling { after: ItemId, level: u8 },
    /// Set one editable field from raw input text.
    UpdateField { item: ItemId, change: ItemField },
    /// Remove an unsaved item and its subtree.
    Remove { item: ItemId },
    /// Defer deletion of a saved item until the next save.
    MarkForDeletion { item: ItemId },
    /// Undo a pending mark.
    Unmark { item: ItemId },
    /// Delete a saved item from the store right away.
    DeleteNow { item: ItemId },
}

/// Snapshot of an editor session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub category_id: CategoryId,
    pub period_id: PeriodId,
    /// Root items with their nested children.
    pub tree: Vec<BudgetItem>,
    /// Saved ids that will be deleted on the next save.
    pub deferred: DeferredDeletions,
    /// Stored items that were left out because their parent is missing.
    /// The next save deletes them from the store.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphans: Vec<i64>,
}

/// Response to an applied [`Edit`].
#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    /// Id of the item an add created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<ItemId>,
    pub session: SessionView,
}

/// Response to a successful save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    pub report: SaveReport,
    /// The canonical tree reloaded from the store.
    pub session: SessionView,
}
