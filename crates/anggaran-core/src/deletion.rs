//! Deletion policy: immediate removal versus deferred, save-time deletion.
//!
//! Unsaved items are simply removed from the tree. A persisted item is either
//! marked for deletion (it stays visible, disabled, until the next save or
//! until it is unmarked) or deleted against the store right away. The marked
//! set is an explicit value passed in and returned, never ambient state.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::ItemId;
use crate::item::BudgetItem;
use crate::tree::BudgetTree;

/// Store ids marked for deletion at the next save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeferredDeletions(IndexSet<i64>);

impl DeferredDeletions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.0.contains(&id)
    }

    /// True when `id` is a persisted item in the set. Temporary ids never are.
    pub fn is_marked(&self, id: ItemId) -> bool {
        id.persistent().is_some_and(|id| self.contains(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    /// Drops ids that no longer need a save-time delete.
    pub fn without(&self, ids: impl IntoIterator<Item = i64>) -> Self {
        let mut next = self.clone();
        for id in ids {
            next.0.shift_remove(&id);
        }
        next
    }
}

impl FromIterator<i64> for DeferredDeletions {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        DeferredDeletions(iter.into_iter().collect())
    }
}

/// How a delete request for an item has to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    /// Unsaved item: removed from the tree, nothing to ask.
    Immediate,
    /// Saved item: the user picks mark-for-deletion or delete-now.
    MarkOrDeleteNow,
}

/// What the caller needs to confirm a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionPrompt {
    pub code: String,
    pub mode: DeletionMode,
    /// Nodes that go with it, the item itself included.
    pub subtree_size: usize,
    /// Whether the item is already marked.
    pub marked: bool,
}

/// Works out the delete choice and the size of what would be removed.
pub fn deletion_prompt(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<DeletionPrompt, CoreError> {
    let item = tree.get(id)?;
    let mode = if id.is_temporary() {
        DeletionMode::Immediate
    } else {
        DeletionMode::MarkOrDeleteNow
    };
    Ok(DeletionPrompt {
        code: item.code.clone(),
        mode,
        subtree_size: item.subtree_size(),
        marked: deferred.is_marked(id),
    })
}

/// Removes an unsaved item (and its subtree) from the tree.
pub fn remove_unsaved(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<BudgetTree, CoreError> {
    let item = tree.get(id)?;
    if !id.is_temporary() {
        return Err(CoreError::DeletionChoiceRequired {
            code: item.code.clone(),
        });
    }
    live_root_remains(tree, deferred, item)?;
    tree.remove_subtree(id)
}

/// Checks that `id` may leave the tree: a root can only go while another
/// root that is not marked stays behind.
pub fn check_removable(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<(), CoreError> {
    live_root_remains(tree, deferred, tree.get(id)?)
}

fn live_root_remains(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    item: &BudgetItem,
) -> Result<(), CoreError> {
    if item.parent_id.is_some() {
        return Ok(());
    }
    let other_live_root = tree
        .roots
        .iter()
        .any(|root| root.id != item.id && !deferred.is_marked(root.id));
    if other_live_root {
        Ok(())
    } else {
        Err(CoreError::LastRoot {
            code: item.code.clone(),
        })
    }
}

/// Marks a saved item and every saved descendant for deletion at save.
///
/// A root cannot be marked while it is the only root left unmarked.
pub fn mark_for_deletion(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<DeferredDeletions, CoreError> {
    let item = tree.get(id)?;
    if id.is_temporary() {
        return Err(CoreError::NotPersisted {
            code: item.code.clone(),
        });
    }
    live_root_remains(tree, deferred, item)?;

    let mut next = deferred.clone();
    for persisted in item.subtree_ids().into_iter().filter_map(|i| i.persistent()) {
        next.0.insert(persisted);
    }
    Ok(next)
}

/// Takes a marked item and its saved descendants back out of the set.
pub fn unmark(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<DeferredDeletions, CoreError> {
    let item = tree.get(id)?;
    if let Some(ancestor) = tree
        .ancestors(id)
        .into_iter()
        .find(|a| deferred.is_marked(a.id))
    {
        return Err(CoreError::AncestorMarked {
            code: item.code.clone(),
            ancestor: ancestor.code.clone(),
        });
    }
    Ok(deferred.without(item.subtree_ids().into_iter().filter_map(|i| i.persistent())))
}

/// True when `id` or one of its ancestors is marked, i.e. the item is
/// excluded from the next save.
pub fn is_excluded(tree: &BudgetTree, deferred: &DeferredDeletions, id: ItemId) -> bool {
    deferred.is_marked(id) || tree.ancestors(id).iter().any(|a| deferred.is_marked(a.id))
}

/// Rejects edits to a marked item or to anything below one. Such items are
/// disabled until unmarked, and a save would drop the edit.
pub fn ensure_editable(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    id: ItemId,
) -> Result<(), CoreError> {
    let item = tree.get(id)?;
    if !is_excluded(tree, deferred, id) {
        return Ok(());
    }
    match tree
        .ancestors(id)
        .into_iter()
        .find(|a| deferred.is_marked(a.id))
    {
        Some(ancestor) => Err(CoreError::AncestorMarked {
            code: item.code.clone(),
            ancestor: ancestor.code.clone(),
        }),
        None => Err(CoreError::ItemMarked {
            code: item.code.clone(),
        }),
    }
}
