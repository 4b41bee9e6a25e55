//! Save planning: diffing the edited tree against the persisted set.
//!
//! [`plan_save`] is the pure half of a save. It validates the tree, works out
//! which store ids to delete, and linearises the remaining nodes into
//! [`SaveTask`]s in pre-order. A task whose parent is not saved yet refers to
//! the parent's task by index, so executing tasks in order always has the
//! parent's real id available before the child is written.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::code::regenerate_codes;
use crate::deletion::DeferredDeletions;
use crate::error::CoreError;
use crate::id::{ItemId, ItemScope};
use crate::item::BudgetItem;
use crate::record::{ItemPayload, ItemRecord};
use crate::rollup::recalculate;
use crate::tree::BudgetTree;

/// The persisted records the editor was opened from, keyed by store id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    records: IndexMap<i64, ItemPayload>,
}

impl Baseline {
    pub fn from_records(records: &[ItemRecord]) -> Self {
        Baseline {
            records: records
                .iter()
                .map(|r| (r.id, r.payload.clone()))
                .collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&ItemPayload> {
        self.records.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forgets ids that were deleted outside a save.
    pub fn without(&self, ids: &[i64]) -> Self {
        let mut records = self.records.clone();
        for id in ids {
            records.shift_remove(id);
        }
        Baseline { records }
    }
}

/// Where a task's store parent id comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "ref", rename_all = "snake_case")]
pub enum ParentRef {
    Root,
    Persistent(i64),
    /// The id assigned by an earlier create task, by index.
    Task(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveOp {
    Create { temp: u64 },
    Update { id: i64 },
}

/// One create or update, with its dependency on an earlier task if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveTask {
    pub op: SaveOp,
    pub parent: ParentRef,
    /// Payload with `parent_id` unset; see [`SaveTask::payload_with_parent`].
    pub payload: ItemPayload,
}

impl SaveTask {
    pub fn code(&self) -> &str {
        &self.payload.code
    }

    pub fn payload_with_parent(&self, parent_id: Option<i64>) -> ItemPayload {
        ItemPayload {
            parent_id,
            ..self.payload.clone()
        }
    }
}

/// Everything a save has to send to the store, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SavePlan {
    /// Store ids to delete, deepest first.
    pub deletes: Vec<i64>,
    /// Creates and updates in pre-order; parents precede their children.
    pub tasks: Vec<SaveTask>,
    /// Persisted items skipped because nothing about them changed.
    pub unchanged: usize,
}

impl SavePlan {
    /// True when executing the plan would issue no store calls.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.tasks.is_empty()
    }

    pub fn creates(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.op, SaveOp::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.tasks.len() - self.creates()
    }
}

/// Plans a save of `tree`.
///
/// Items marked in `deferred`, and everything below them, are left out of
/// validation and of the create/update tasks. What remains is re-coded and
/// re-totalled as if the marked subtrees were already gone, so the stored
/// codes and parent totals match the stored children. Persisted ids that
/// disappeared from the tree or were marked become deletes; this includes
/// orphaned records the tree builder left out. Fails on the first visible
/// item without a name, or when every root is marked, before anything is
/// planned.
pub fn plan_save(
    tree: &BudgetTree,
    deferred: &DeferredDeletions,
    baseline: &Baseline,
    scope: ItemScope,
) -> Result<SavePlan, CoreError> {
    validate(&tree.roots, deferred)?;

    let present = tree.persisted_ids();
    let mut deletes: Vec<i64> = baseline
        .ids()
        .filter(|id| !present.contains(id))
        .chain(deferred.iter())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    // Children before parents, so a cascading parent delete never races a
    // child delete that is still pending.
    deletes.sort_by_key(|id| {
        let level = baseline
            .get(*id)
            .map(|p| p.level)
            .or_else(|| tree.find(ItemId::Persistent(*id)).map(|i| i.level))
            .unwrap_or(0);
        (std::cmp::Reverse(level), *id)
    });

    let mut plan = SavePlan {
        deletes,
        ..SavePlan::default()
    };
    let live = without_marked(tree, deferred);
    if live.roots.is_empty() {
        if let Some(first) = tree.roots.first() {
            return Err(CoreError::LastRoot {
                code: first.code.clone(),
            });
        }
    }
    for root in &live.roots {
        plan_item(root, ParentRef::Root, baseline, scope, &mut plan);
    }
    Ok(plan)
}

/// The tree as it will be stored.
fn without_marked(tree: &BudgetTree, deferred: &DeferredDeletions) -> BudgetTree {
    fn prune(items: &[BudgetItem], deferred: &DeferredDeletions) -> Vec<BudgetItem> {
        items
            .iter()
            .filter(|item| !deferred.is_marked(item.id))
            .map(|item| BudgetItem {
                children: prune(&item.children, deferred),
                ..item.clone()
            })
            .collect()
    }

    if deferred.is_empty() {
        return tree.clone();
    }
    let mut live = tree.clone();
    live.roots = prune(&tree.roots, deferred);
    recalculate(regenerate_codes(live))
}

fn validate(items: &[BudgetItem], deferred: &DeferredDeletions) -> Result<(), CoreError> {
    for item in items {
        if deferred.is_marked(item.id) {
            continue;
        }
        if item.name.trim().is_empty() {
            return Err(CoreError::MissingName {
                code: item.code.clone(),
            });
        }
        validate(&item.children, deferred)?;
    }
    Ok(())
}

fn plan_item(
    item: &BudgetItem,
    parent: ParentRef,
    baseline: &Baseline,
    scope: ItemScope,
    plan: &mut SavePlan,
) {
    let child_parent = match item.id {
        ItemId::Temporary(temp) => {
            plan.tasks.push(SaveTask {
                op: SaveOp::Create { temp },
                parent,
                payload: ItemPayload::from_item(item, scope, None),
            });
            ParentRef::Task(plan.tasks.len() - 1)
        }
        ItemId::Persistent(id) => {
            let known_parent = match parent {
                ParentRef::Root => Some(None),
                ParentRef::Persistent(p) => Some(Some(p)),
                ParentRef::Task(_) => None,
            };
            let unchanged = known_parent.is_some_and(|parent_id| {
                baseline.get(id) == Some(&ItemPayload::from_item(item, scope, parent_id))
            });
            if unchanged {
                plan.unchanged += 1;
            } else {
                plan.tasks.push(SaveTask {
                    op: SaveOp::Update { id },
                    parent,
                    payload: ItemPayload::from_item(item, scope, None),
                });
            }
            ParentRef::Persistent(id)
        }
    };

    for child in &item.children {
        plan_item(child, child_parent, baseline, scope, plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deletion::mark_for_deletion;
    use crate::id::{CategoryId, PeriodId};
    use crate::item::ItemField;
    use crate::tree::build_tree;

    fn scope() -> ItemScope {
        ItemScope::new(CategoryId(1), PeriodId(1))
    }

    fn record(id: i64, parent: Option<i64>, code: &str, level: u8, order: u32, total: f64) -> ItemRecord {
        ItemRecord::new(
            id,
            ItemPayload {
                category_id: CategoryId(1),
                period_id: PeriodId(1),
                parent_id: parent,
                code: code.into(),
                name: format!("Pos {}", code),
                description: None,
                level,
                order,
                target_frequency: None,
                frequency_unit: None,
                unit_amount: None,
                total_target: Some(total),
            },
        )
    }

    fn saved() -> Vec<ItemRecord> {
        vec![
            record(1, None, "A", 1, 1, 30.0),
            record(2, Some(1), "A.1", 2, 1, 10.0),
            record(3, Some(1), "A.2", 2, 2, 20.0),
        ]
    }

    fn name_all(mut tree: BudgetTree) -> BudgetTree {
        let ids: Vec<ItemId> = tree.iter().map(|i| i.id).collect();
        for id in ids {
            tree = tree.update_field(id, ItemField::Name(format!("Pos {}", id))).unwrap();
        }
        tree
    }

    #[test]
    fn unchanged_tree_plans_nothing() {
        let records = saved();
        let plan = plan_save(
            &build_tree(&records),
            &DeferredDeletions::new(),
            &Baseline::from_records(&records),
            scope(),
        )
        .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 3);
    }

    #[test]
    fn new_subtree_creates_parent_first() {
        let tree = name_all(BudgetTree::seeded());
        let root = tree.roots[0].id;
        let (tree, a1) = tree.add_child(root).unwrap();
        let (tree, _a2) = tree.add_sibling(a1, 2).unwrap();
        let tree = name_all(tree);

        let plan = plan_save(&tree, &DeferredDeletions::new(), &Baseline::default(), scope()).unwrap();
        assert_eq!(plan.creates(), 3);
        assert_eq!(plan.tasks[0].parent, ParentRef::Root);
        assert_eq!(plan.tasks[0].code(), "A");
        assert_eq!(plan.tasks[1].parent, ParentRef::Task(0));
        assert_eq!(plan.tasks[2].parent, ParentRef::Task(0));
    }

    #[test]
    fn task_parents_always_point_backwards() {
        let tree = name_all(BudgetTree::seeded());
        let (tree, a1) = tree.add_child(tree.roots[0].id).unwrap();
        let (tree, a11) = tree.add_child(a1).unwrap();
        let (tree, _) = tree.add_child(a11).unwrap();
        let (tree, _) = tree.add_sibling(a1, 2).unwrap();
        let tree = name_all(tree);

        let plan = plan_save(&tree, &DeferredDeletions::new(), &Baseline::default(), scope()).unwrap();
        for (index, task) in plan.tasks.iter().enumerate() {
            if let ParentRef::Task(parent) = task.parent {
                assert!(parent < index);
            }
        }
    }

    #[test]
    fn missing_name_fails_fast_with_code() {
        let tree = name_all(BudgetTree::seeded());
        let (tree, _) = tree.add_child(tree.roots[0].id).unwrap();
        let err = plan_save(&tree, &DeferredDeletions::new(), &Baseline::default(), scope()).unwrap_err();
        assert_eq!(err, CoreError::MissingName { code: "A.1".into() });
    }

    #[test]
    fn removed_and_marked_items_become_deletes() {
        let records = vec![
            record(1, None, "A", 1, 1, 30.0),
            record(2, Some(1), "A.1", 2, 1, 10.0),
            record(3, Some(1), "A.2", 2, 2, 20.0),
            record(4, None, "B", 1, 2, 0.0),
            record(5, Some(4), "B.1", 2, 1, 0.0),
        ];
        let baseline = Baseline::from_records(&records);
        let tree = build_tree(&records);
        let tree = tree.remove_subtree(ItemId::Persistent(2)).unwrap();
        let deferred = mark_for_deletion(&tree, &DeferredDeletions::new(), ItemId::Persistent(4)).unwrap();

        let plan = plan_save(&tree, &deferred, &baseline, scope()).unwrap();
        // Level-2 ids first, then the level-1 id.
        assert_eq!(plan.deletes, vec![2, 5, 4]);
        // A.2 moved up to A.1 and the parent total changed: two updates.
        assert_eq!(plan.updates(), 2);
        assert_eq!(plan.creates(), 0);
    }

    #[test]
    fn marked_items_are_settled_out_before_planning() {
        let records = saved();
        let tree = build_tree(&records);
        let deferred = mark_for_deletion(&tree, &DeferredDeletions::new(), ItemId::Persistent(2)).unwrap();
        let plan = plan_save(&tree, &deferred, &Baseline::from_records(&records), scope()).unwrap();

        assert_eq!(plan.deletes, vec![2]);
        let moved = plan
            .tasks
            .iter()
            .find(|t| t.op == SaveOp::Update { id: 3 })
            .unwrap();
        assert_eq!(moved.code(), "A.1");
        assert_eq!(moved.payload.order, 1);
        let root = plan
            .tasks
            .iter()
            .find(|t| t.op == SaveOp::Update { id: 1 })
            .unwrap();
        assert_eq!(root.payload.total_target, Some(20.0));
        // The visible tree is untouched.
        assert_eq!(tree.find(ItemId::Persistent(3)).unwrap().code, "A.2");
    }

    #[test]
    fn marked_items_skip_name_validation() {
        let records = saved();
        let tree = build_tree(&records);
        let tree = tree
            .update_field(ItemId::Persistent(3), ItemField::Name("  ".into()))
            .unwrap();
        let deferred = mark_for_deletion(&tree, &DeferredDeletions::new(), ItemId::Persistent(3)).unwrap();
        let plan = plan_save(&tree, &deferred, &Baseline::from_records(&records), scope()).unwrap();
        assert_eq!(plan.deletes, vec![3]);
    }

    #[test]
    fn temporary_children_of_marked_items_are_not_created() {
        let records = saved();
        let tree = build_tree(&records);
        let (tree, temp) = tree.add_child(ItemId::Persistent(3)).unwrap();
        let tree = tree.update_field(temp, ItemField::Name("baru".into())).unwrap();
        let deferred = mark_for_deletion(&tree, &DeferredDeletions::new(), ItemId::Persistent(3)).unwrap();
        let plan = plan_save(&tree, &deferred, &Baseline::from_records(&records), scope()).unwrap();
        assert_eq!(plan.creates(), 0);
    }

    #[test]
    fn persisted_parent_is_referenced_directly() {
        let records = saved();
        let tree = build_tree(&records);
        let (tree, temp) = tree.add_child(ItemId::Persistent(2)).unwrap();
        let tree = tree.update_field(temp, ItemField::Name("baru".into())).unwrap();
        let plan = plan_save(&tree, &DeferredDeletions::new(), &Baseline::from_records(&records), scope()).unwrap();
        let create = plan
            .tasks
            .iter()
            .find(|t| matches!(t.op, SaveOp::Create { .. }))
            .unwrap();
        assert_eq!(create.parent, ParentRef::Persistent(2));
        assert_eq!(create.code(), "A.1.1");
    }

    #[test]
    fn all_roots_marked_is_rejected() {
        let records = saved();
        let tree = build_tree(&records);
        // Bypasses the marking guard to reach the planner's own check.
        let deferred: DeferredDeletions = [1, 2, 3].into_iter().collect();
        let err = plan_save(&tree, &deferred, &Baseline::from_records(&records), scope()).unwrap_err();
        assert_eq!(err, CoreError::LastRoot { code: "A".into() });
    }

    #[test]
    fn orphaned_records_are_deleted_by_the_next_save() {
        let mut records = saved();
        records.push(record(9, Some(404), "X.1", 2, 1, 0.0));
        let outcome = crate::tree::build_tree_checked(&records);
        assert_eq!(outcome.orphans, vec![9]);

        let plan = plan_save(
            &outcome.tree,
            &DeferredDeletions::new(),
            &Baseline::from_records(&records),
            scope(),
        )
        .unwrap();
        assert_eq!(plan.deletes, vec![9]);
        assert!(plan.tasks.is_empty());
    }
}
