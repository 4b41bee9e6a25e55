//! Executing save plans and immediate deletes against an [`ItemStore`].
//!
//! This is the I/O half of the save path. [`execute_plan`] runs a
//! [`SavePlan`] produced by `anggaran_core::plan_save`: deletes first, then
//! creates and updates in plan order, feeding each assigned id into the tasks
//! that depend on it. The first failing call aborts the save; calls already
//! issued are not undone.

use serde::Serialize;
use thiserror::Error;

use anggaran_core::{
    build_tree_checked, deletion, plan_save, Baseline, BudgetTree, CoreError, DeferredDeletions, ItemId,
    ItemScope, ParentRef, SaveOp, SavePlan,
};

use crate::error::StorageError;
use crate::traits::ItemStore;

/// A save that was rejected up front or failed partway through.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Validation or structural rejection; nothing was sent to the store.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("failed to delete item {id}: {source}")]
    Delete {
        id: i64,
        #[source]
        source: StorageError,
    },

    #[error("failed to create item '{code}': {source}")]
    Create {
        code: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to update item '{code}' ({id}): {source}")]
    Update {
        code: String,
        id: i64,
        #[source]
        source: StorageError,
    },

    /// Reloading the saved tree failed.
    #[error("failed to reload items: {0}")]
    Reload(#[source] StorageError),

    /// A task referred to a parent task that has not produced an id.
    #[error("item '{code}' depends on task {parent}, which has not run")]
    UnresolvedParent { code: String, parent: usize },
}

/// What a save did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    /// Temporary sequence number and the store id it received.
    pub created: Vec<(u64, i64)>,
    pub updated: usize,
    pub deleted: usize,
    /// Deletes the store answered with not-found.
    pub already_gone: Vec<i64>,
}

impl SaveReport {
    /// Number of store calls that changed something.
    pub fn calls(&self) -> usize {
        self.created.len() + self.updated + self.deleted
    }
}

/// Runs a plan against the store, in order.
pub fn execute_plan<S: ItemStore + ?Sized>(
    store: &mut S,
    plan: &SavePlan,
) -> Result<SaveReport, SaveError> {
    let mut report = SaveReport::default();

    for &id in &plan.deletes {
        match store.delete_item(id) {
            Ok(()) => report.deleted += 1,
            Err(err) if err.is_not_found() => {
                tracing::warn!(item = id, "item already gone, skipping delete");
                report.already_gone.push(id);
            }
            Err(source) => {
                tracing::error!(item = id, error = %source, "delete failed, aborting save");
                return Err(SaveError::Delete { id, source });
            }
        }
    }

    // Store id produced by each task, by task index.
    let mut assigned: Vec<Option<i64>> = vec![None; plan.tasks.len()];
    for (index, task) in plan.tasks.iter().enumerate() {
        let parent_id = match task.parent {
            ParentRef::Root => None,
            ParentRef::Persistent(id) => Some(id),
            ParentRef::Task(parent) => Some(assigned.get(parent).copied().flatten().ok_or_else(
                || SaveError::UnresolvedParent {
                    code: task.code().to_string(),
                    parent,
                },
            )?),
        };
        let payload = task.payload_with_parent(parent_id);

        match task.op {
            SaveOp::Create { temp } => {
                let record = store.create_item(&payload).map_err(|source| {
                    tracing::error!(code = task.code(), error = %source, "create failed, aborting save");
                    SaveError::Create {
                        code: task.code().to_string(),
                        source,
                    }
                })?;
                tracing::debug!(code = task.code(), id = record.id, "created item");
                assigned[index] = Some(record.id);
                report.created.push((temp, record.id));
            }
            SaveOp::Update { id } => {
                store.update_item(id, &payload).map_err(|source| {
                    tracing::error!(code = task.code(), id, error = %source, "update failed, aborting save");
                    SaveError::Update {
                        code: task.code().to_string(),
                        id,
                        source,
                    }
                })?;
                assigned[index] = Some(id);
                report.updated += 1;
            }
        }
    }

    Ok(report)
}

/// A freshly loaded editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTree {
    pub tree: BudgetTree,
    pub baseline: Baseline,
    /// Records dropped because their parent is missing. They are still in
    /// the baseline, so the next save deletes them from the store.
    pub orphans: Vec<i64>,
}

/// Fetches a scope and builds its tree. An empty scope yields the seeded
/// single root.
pub fn load_tree<S: ItemStore + ?Sized>(
    store: &S,
    scope: ItemScope,
) -> Result<LoadedTree, StorageError> {
    let records = store.list_items(scope)?;
    let outcome = build_tree_checked(&records);
    if !outcome.orphans.is_empty() {
        tracing::warn!(
            %scope,
            orphans = ?outcome.orphans,
            "items with missing parents were dropped; the next save deletes them"
        );
    }
    let tree = if outcome.tree.is_empty() {
        BudgetTree::seeded()
    } else {
        outcome.tree
    };
    Ok(LoadedTree {
        tree,
        baseline: Baseline::from_records(&records),
        orphans: outcome.orphans,
    })
}

/// Result of a successful [`save_tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub report: SaveReport,
    /// Canonical state reloaded from the store. The deferred set is empty
    /// after a save.
    pub loaded: LoadedTree,
}

/// Plans, executes and reloads: the whole save of one editor.
///
/// On error the caller keeps its working tree and deferred set so the user
/// can fix the problem and retry.
pub fn save_tree<S: ItemStore + ?Sized>(
    store: &mut S,
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    baseline: &Baseline,
    scope: ItemScope,
) -> Result<SaveOutcome, SaveError> {
    let plan = plan_save(tree, deferred, baseline, scope)?;
    tracing::info!(
        %scope,
        deletes = plan.deletes.len(),
        creates = plan.creates(),
        updates = plan.updates(),
        unchanged = plan.unchanged,
        "saving budget tree"
    );
    let report = execute_plan(store, &plan)?;
    let loaded = load_tree(store, scope).map_err(SaveError::Reload)?;
    Ok(SaveOutcome { report, loaded })
}

/// State after an immediate delete.
#[derive(Debug, Clone, PartialEq)]
pub struct Deleted {
    pub tree: BudgetTree,
    pub deferred: DeferredDeletions,
    pub baseline: Baseline,
}

/// Deletes a saved item from the store now, then removes its subtree from
/// the working tree. Not undoable.
///
/// Structural checks run before the store is called, so deleting the last
/// root that is not marked never reaches the store.
pub fn delete_immediately<S: ItemStore + ?Sized>(
    store: &mut S,
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    baseline: &Baseline,
    id: ItemId,
) -> Result<Deleted, SaveError> {
    deletion::check_removable(tree, deferred, id)?;
    let item = tree.get(id)?;
    let store_id = id.persistent().ok_or_else(|| CoreError::NotPersisted {
        code: item.code.clone(),
    })?;
    let gone: Vec<i64> = item
        .subtree_ids()
        .into_iter()
        .filter_map(|i| i.persistent())
        .collect();
    let next_tree = tree.remove_subtree(id)?;

    match store.delete_item(store_id) {
        Ok(()) => tracing::info!(item = store_id, removed = gone.len(), "deleted item now"),
        Err(err) if err.is_not_found() => {
            tracing::warn!(item = store_id, "item already gone, removing locally");
        }
        Err(source) => return Err(SaveError::Delete { id: store_id, source }),
    }

    Ok(Deleted {
        tree: next_tree,
        deferred: deferred.without(gone.iter().copied()),
        baseline: baseline.without(&gone),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use anggaran_core::{ItemField, ItemPayload};

    fn setup() -> (InMemoryStore, ItemScope) {
        let mut store = InMemoryStore::new();
        let category = store.create_category("Persembahan").unwrap();
        let period = store.create_period("2025", 2025).unwrap();
        (store, ItemScope::new(category.id, period.id))
    }

    fn named(tree: BudgetTree, id: ItemId, name: &str) -> BudgetTree {
        tree.update_field(id, ItemField::Name(name.into())).unwrap()
    }

    #[test]
    fn empty_scope_loads_seeded_root() {
        let (store, scope) = setup();
        let loaded = load_tree(&store, scope).unwrap();
        assert_eq!(loaded.tree.roots.len(), 1);
        assert_eq!(loaded.tree.roots[0].code, "A");
        assert!(loaded.baseline.is_empty());
    }

    #[test]
    fn save_replaces_temporary_ids() {
        let (mut store, scope) = setup();
        let loaded = load_tree(&store, scope).unwrap();
        let root = loaded.tree.roots[0].id;
        let tree = named(loaded.tree, root, "Pendapatan");
        let (tree, child) = tree.add_child(root).unwrap();
        let tree = named(tree, child, "Kolekte");

        let outcome = save_tree(&mut store, &tree, &DeferredDeletions::new(), &loaded.baseline, scope).unwrap();
        assert_eq!(outcome.report.created.len(), 2);
        assert!(outcome.loaded.tree.iter().all(|i| !i.id.is_temporary()));
        assert_eq!(outcome.loaded.tree.roots[0].children[0].code, "A.1");
    }

    #[test]
    fn unresolved_parent_is_reported() {
        let (mut store, scope) = setup();
        let plan = SavePlan {
            tasks: vec![anggaran_core::SaveTask {
                op: SaveOp::Create { temp: 2 },
                parent: ParentRef::Task(5),
                payload: ItemPayload {
                    category_id: scope.category,
                    period_id: scope.period,
                    parent_id: None,
                    code: "A.1".into(),
                    name: "x".into(),
                    description: None,
                    level: 2,
                    order: 1,
                    target_frequency: None,
                    frequency_unit: None,
                    unit_amount: None,
                    total_target: None,
                },
            }],
            ..SavePlan::default()
        };
        let err = execute_plan(&mut store, &plan).unwrap_err();
        assert!(matches!(err, SaveError::UnresolvedParent { parent: 5, .. }));
    }

    #[test]
    fn rejected_plan_touches_nothing() {
        let (mut store, scope) = setup();
        let loaded = load_tree(&store, scope).unwrap();
        let err = save_tree(
            &mut store,
            &loaded.tree,
            &DeferredDeletions::new(),
            &loaded.baseline,
            scope,
        )
        .unwrap_err();
        assert!(matches!(err, SaveError::Rejected(CoreError::MissingName { .. })));
        assert!(store.list_items(scope).unwrap().is_empty());
    }
}
