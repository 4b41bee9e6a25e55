//! The budget tree container and the flat-record Tree Builder.
//!
//! [`BudgetTree`] owns the root list plus the counter temporary ids are
//! allocated from, so every edit can return a new tree value without touching
//! shared state. [`build_tree`] reconstructs the nested tree from the flat
//! parent-pointer list the store returns.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::CoreError;
use crate::id::{ItemId, ItemScope};
use crate::item::{BudgetItem, NumericInput};
use crate::record::{ItemPayload, ItemRecord};

/// Index path from the root list down to a node. Depth is bounded by
/// [`crate::item::MAX_LEVEL`], so paths stay inline.
pub type ItemPath = SmallVec<[usize; 4]>;

/// A budget tree: ordered roots and the next temporary id to hand out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTree {
    pub roots: Vec<BudgetItem>,
    next_temp: u64,
}

impl BudgetTree {
    /// Wraps an already-built root list.
    pub fn from_roots(roots: Vec<BudgetItem>) -> Self {
        let next_temp = roots
            .iter()
            .flat_map(BudgetItem::subtree_ids)
            .filter_map(|id| match id {
                ItemId::Temporary(seq) => Some(seq + 1),
                ItemId::Persistent(_) => None,
            })
            .max()
            .unwrap_or(1);
        BudgetTree { roots, next_temp }
    }

    /// The single initial root used when a category/period has no items yet.
    pub fn seeded() -> Self {
        let mut root = BudgetItem::empty(ItemId::Temporary(1), None, 1);
        root.code = crate::code::generate_code(None, 0, 1);
        root.order = 1;
        BudgetTree {
            roots: vec![root],
            next_temp: 2,
        }
    }

    /// Hands out a fresh temporary id.
    pub(crate) fn allocate_temp(&mut self) -> ItemId {
        let id = ItemId::Temporary(self.next_temp);
        self.next_temp += 1;
        id
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total node count.
    pub fn len(&self) -> usize {
        self.roots.iter().map(BudgetItem::subtree_size).sum()
    }

    /// Depth-first, pre-order traversal of every node.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// Index path to the node with `id`.
    pub fn path_of(&self, id: ItemId) -> Option<ItemPath> {
        fn search(items: &[BudgetItem], id: ItemId, path: &mut ItemPath) -> bool {
            for (index, item) in items.iter().enumerate() {
                path.push(index);
                if item.id == id || search(&item.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = ItemPath::new();
        search(&self.roots, id, &mut path).then_some(path)
    }

    pub fn find(&self, id: ItemId) -> Option<&BudgetItem> {
        self.iter().find(|item| item.id == id)
    }

    /// Like [`find`](Self::find) but with a typed error.
    pub fn get(&self, id: ItemId) -> Result<&BudgetItem, CoreError> {
        self.find(id).ok_or(CoreError::ItemNotFound { id })
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.find(id).is_some()
    }

    pub(crate) fn item_at_mut(&mut self, path: &[usize]) -> Option<&mut BudgetItem> {
        let (first, rest) = path.split_first()?;
        let mut item = self.roots.get_mut(*first)?;
        for index in rest {
            item = item.children.get_mut(*index)?;
        }
        Some(item)
    }

    /// Sibling list that holds the node at `path` (the root list for roots).
    pub(crate) fn siblings_mut(&mut self, path: &[usize]) -> Option<&mut Vec<BudgetItem>> {
        match path.split_last() {
            Some((_, [])) => Some(&mut self.roots),
            Some((_, parent)) => self.item_at_mut(parent).map(|p| &mut p.children),
            None => None,
        }
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ItemId) -> Vec<&BudgetItem> {
        let Some(path) = self.path_of(id) else {
            return Vec::new();
        };
        let mut chain = Vec::with_capacity(path.len());
        let mut items = &self.roots;
        for index in &path[..path.len() - 1] {
            let item = &items[*index];
            chain.push(item);
            items = &item.children;
        }
        chain.reverse();
        chain
    }

    /// Inclusive node count of the subtree rooted at `id`.
    pub fn subtree_size(&self, id: ItemId) -> Option<usize> {
        self.find(id).map(BudgetItem::subtree_size)
    }

    /// Store ids of every persisted node in the tree.
    pub fn persisted_ids(&self) -> HashSet<i64> {
        self.iter().filter_map(|item| item.id.persistent()).collect()
    }
}

/// Pre-order iterator over a [`BudgetTree`].
pub struct PreOrder<'a> {
    stack: Vec<&'a BudgetItem>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a BudgetItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stack.pop()?;
        self.stack.extend(item.children.iter().rev());
        Some(item)
    }
}

/// Result of [`build_tree_checked`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub tree: BudgetTree,
    /// Records that could not be attached: their parent is missing from the
    /// batch, or they sit below such a record.
    pub orphans: Vec<i64>,
}

/// Reconstructs the nested tree from flat records, dropping orphans.
///
/// Persisted codes are trusted; nothing is regenerated here.
pub fn build_tree(records: &[ItemRecord]) -> BudgetTree {
    build_tree_checked(records).tree
}

/// Reconstructs the nested tree and reports records that were dropped.
pub fn build_tree_checked(records: &[ItemRecord]) -> BuildOutcome {
    let mut children_of: HashMap<i64, Vec<&ItemRecord>> = HashMap::new();
    let mut roots: Vec<&ItemRecord> = Vec::new();

    for record in records {
        match record.parent_id() {
            Some(parent) => children_of.entry(parent).or_default().push(record),
            None => roots.push(record),
        }
    }

    let mut attached = HashSet::new();
    roots.sort_by_key(|r| r.payload.order);
    let roots = roots
        .into_iter()
        .filter_map(|r| assemble(r, &children_of, &mut attached))
        .collect();

    let mut orphans: Vec<i64> = records
        .iter()
        .map(|r| r.id)
        .filter(|id| !attached.contains(id))
        .collect();
    orphans.sort_unstable();
    orphans.dedup();

    BuildOutcome {
        tree: BudgetTree::from_roots(roots),
        orphans,
    }
}

fn assemble(
    record: &ItemRecord,
    children_of: &HashMap<i64, Vec<&ItemRecord>>,
    attached: &mut HashSet<i64>,
) -> Option<BudgetItem> {
    // A repeated id would otherwise recurse forever through a cycle.
    if !attached.insert(record.id) {
        return None;
    }

    let mut item = item_from_record(record);
    if let Some(children) = children_of.get(&record.id) {
        let mut children = children.clone();
        children.sort_by_key(|r| r.payload.order);
        item.children = children
            .into_iter()
            .filter_map(|child| assemble(child, children_of, attached))
            .collect();
    }
    Some(item)
}

fn item_from_record(record: &ItemRecord) -> BudgetItem {
    let p = &record.payload;
    BudgetItem {
        id: ItemId::Persistent(record.id),
        parent_id: p.parent_id.map(ItemId::Persistent),
        level: p.level,
        code: p.code.clone(),
        order: p.order,
        name: p.name.clone(),
        description: p.description.clone().unwrap_or_default(),
        target_frequency: NumericInput::from_optional(p.target_frequency),
        frequency_unit: p.frequency_unit.clone().unwrap_or_default(),
        unit_amount: NumericInput::from_optional(p.unit_amount),
        total_target: NumericInput::from_optional(p.total_target),
        children: Vec::new(),
    }
}

/// Inverse of [`build_tree`]: emits one record per node, pre-order, with
/// parent pointers. Every node must already carry a store id.
pub fn flatten(tree: &BudgetTree, scope: ItemScope) -> Result<Vec<ItemRecord>, CoreError> {
    let mut out = Vec::with_capacity(tree.len());
    for item in tree.iter() {
        let id = item.id.persistent().ok_or_else(|| CoreError::NotPersisted {
            code: item.code.clone(),
        })?;
        let parent = match item.parent_id {
            Some(parent) => Some(parent.persistent().ok_or_else(|| CoreError::NotPersisted {
                code: item.code.clone(),
            })?),
            None => None,
        };
        out.push(ItemRecord::new(id, ItemPayload::from_item(item, scope, parent)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{CategoryId, PeriodId};

    fn record(id: i64, parent: Option<i64>, code: &str, level: u8, order: u32) -> ItemRecord {
        ItemRecord::new(
            id,
            ItemPayload {
                category_id: CategoryId(1),
                period_id: PeriodId(1),
                parent_id: parent,
                code: code.into(),
                name: format!("item {}", code),
                description: None,
                level,
                order,
                target_frequency: None,
                frequency_unit: None,
                unit_amount: None,
                total_target: Some(0.0),
            },
        )
    }

    #[test]
    fn builds_nested_tree_in_order() {
        let records = vec![
            record(3, Some(1), "A.2", 2, 2),
            record(1, None, "A", 1, 1),
            record(2, Some(1), "A.1", 2, 1),
            record(4, None, "B", 1, 2),
            record(5, Some(2), "A.1.1", 3, 1),
        ];
        let tree = build_tree(&records);

        assert_eq!(tree.roots.len(), 2);
        assert_eq!(tree.roots[0].code, "A");
        assert_eq!(tree.roots[1].code, "B");
        let a = &tree.roots[0];
        assert_eq!(a.children[0].code, "A.1");
        assert_eq!(a.children[1].code, "A.2");
        assert_eq!(a.children[0].children[0].code, "A.1.1");
        assert_eq!(a.children[0].parent_id, Some(ItemId::Persistent(1)));
    }

    #[test]
    fn persisted_codes_are_trusted() {
        let records = vec![record(1, None, "Z", 1, 1)];
        let tree = build_tree(&records);
        assert_eq!(tree.roots[0].code, "Z");
    }

    #[test]
    fn dangling_parent_drops_the_orphan_and_its_subtree() {
        let records = vec![
            record(1, None, "A", 1, 1),
            record(7, Some(99), "X.1", 2, 1),
            record(8, Some(7), "X.1.1", 3, 1),
        ];
        let outcome = build_tree_checked(&records);
        assert_eq!(outcome.tree.len(), 1);
        assert_eq!(outcome.orphans, vec![7, 8]);
    }

    #[test]
    fn cyclic_records_are_reported_not_looped() {
        let records = vec![
            record(1, None, "A", 1, 1),
            record(2, Some(3), "?", 2, 1),
            record(3, Some(2), "?", 2, 1),
        ];
        let outcome = build_tree_checked(&records);
        assert_eq!(outcome.tree.len(), 1);
        assert_eq!(outcome.orphans, vec![2, 3]);
    }

    #[test]
    fn empty_input_builds_empty_tree() {
        let tree = build_tree(&[]);
        assert!(tree.is_empty());
    }

    #[test]
    fn seeded_tree_has_single_root_a() {
        let tree = BudgetTree::seeded();
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].code, "A");
        assert_eq!(tree.roots[0].level, 1);
        assert_eq!(tree.roots[0].order, 1);
        assert!(tree.roots[0].id.is_temporary());
    }

    #[test]
    fn temp_counter_continues_after_existing_ids() {
        let mut tree = BudgetTree::from_roots(vec![BudgetItem::empty(ItemId::Temporary(9), None, 1)]);
        assert_eq!(tree.allocate_temp(), ItemId::Temporary(10));
        assert_eq!(tree.allocate_temp(), ItemId::Temporary(11));
    }

    #[test]
    fn path_and_ancestors() {
        let records = vec![
            record(1, None, "A", 1, 1),
            record(2, Some(1), "A.1", 2, 1),
            record(3, Some(2), "A.1.1", 3, 1),
        ];
        let tree = build_tree(&records);
        assert_eq!(tree.path_of(ItemId::Persistent(3)).unwrap().as_slice(), &[0, 0, 0]);
        let codes: Vec<&str> = tree
            .ancestors(ItemId::Persistent(3))
            .iter()
            .map(|i| i.code.as_str())
            .collect();
        assert_eq!(codes, vec!["A.1", "A"]);
        assert!(tree.ancestors(ItemId::Persistent(1)).is_empty());
        assert_eq!(tree.subtree_size(ItemId::Persistent(1)), Some(3));
    }

    #[test]
    fn flatten_round_trips_structure() {
        let records = vec![
            record(1, None, "A", 1, 1),
            record(2, Some(1), "A.1", 2, 1),
            record(3, None, "B", 1, 2),
        ];
        let scope = ItemScope::new(CategoryId(1), PeriodId(1));
        let tree = build_tree(&records);
        let flat = flatten(&tree, scope).unwrap();
        assert_eq!(build_tree(&flat), tree);
    }

    #[test]
    fn flatten_rejects_unsaved_items() {
        let scope = ItemScope::new(CategoryId(1), PeriodId(1));
        assert_eq!(
            flatten(&BudgetTree::seeded(), scope),
            Err(CoreError::NotPersisted { code: "A".into() })
        );
    }
}
