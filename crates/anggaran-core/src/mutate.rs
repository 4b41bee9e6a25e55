//! Structural and field edits on a [`BudgetTree`].
//!
//! Every operation borrows the current tree and returns a new one; the
//! caller's value is never modified. Shape changes are always followed by
//! code regeneration and a rollup pass, field edits by a rollup pass.

use crate::code::regenerate_codes;
use crate::error::CoreError;
use crate::id::ItemId;
use crate::item::{BudgetItem, ItemField, NumericInput, MAX_LEVEL};
use crate::rollup::recalculate;
use crate::tree::BudgetTree;

/// Re-derives codes and totals after a shape change.
fn settle(tree: BudgetTree) -> BudgetTree {
    recalculate(regenerate_codes(tree))
}

impl BudgetTree {
    /// Appends an empty child under `parent`. Returns the new tree and the
    /// child's temporary id.
    pub fn add_child(&self, parent: ItemId) -> Result<(BudgetTree, ItemId), CoreError> {
        let path = self.path_of(parent).ok_or(CoreError::ItemNotFound { id: parent })?;
        let mut next = self.clone();
        let id = next.allocate_temp();

        let parent_item = next
            .item_at_mut(&path)
            .ok_or(CoreError::ItemNotFound { id: parent })?;
        if parent_item.level >= MAX_LEVEL {
            return Err(CoreError::MaxDepthExceeded {
                code: parent_item.code.clone(),
                level: parent_item.level,
            });
        }
        let level = parent_item.level + 1;
        parent_item
            .children
            .push(BudgetItem::empty(id, Some(parent), level));

        Ok((settle(next), id))
    }

    /// Inserts an empty node directly after `after`, in the same sibling list.
    /// `level` must be the level `after` sits at.
    pub fn add_sibling(&self, after: ItemId, level: u8) -> Result<(BudgetTree, ItemId), CoreError> {
        let anchor = self.get(after)?;
        if anchor.level != level {
            return Err(CoreError::LevelMismatch {
                code: anchor.code.clone(),
                expected: level,
                found: anchor.level,
            });
        }
        let parent_id = anchor.parent_id;
        let path = self.path_of(after).ok_or(CoreError::ItemNotFound { id: after })?;
        let position = path[path.len() - 1] + 1;

        let mut next = self.clone();
        let id = next.allocate_temp();
        let siblings = next
            .siblings_mut(&path)
            .ok_or(CoreError::ItemNotFound { id: after })?;
        siblings.insert(position, BudgetItem::empty(id, parent_id, level));

        Ok((settle(next), id))
    }

    /// Sets one field on `id`.
    ///
    /// On a leaf, editing frequency or unit amount re-derives the total as
    /// `frequency * amount` when both parse. Ancestor totals are always
    /// recomputed.
    pub fn update_field(&self, id: ItemId, field: ItemField) -> Result<BudgetTree, CoreError> {
        let path = self.path_of(id).ok_or(CoreError::ItemNotFound { id })?;
        let mut next = self.clone();
        let item = next.item_at_mut(&path).ok_or(CoreError::ItemNotFound { id })?;

        let derives_total = matches!(
            field,
            ItemField::TargetFrequency(_) | ItemField::UnitAmount(_)
        );
        match field {
            ItemField::Name(value) => item.name = value,
            ItemField::Description(value) => item.description = value,
            ItemField::TargetFrequency(value) => item.target_frequency = NumericInput::new(value),
            ItemField::FrequencyUnit(value) => item.frequency_unit = value,
            ItemField::UnitAmount(value) => item.unit_amount = NumericInput::new(value),
            ItemField::TotalTarget(value) => item.total_target = NumericInput::new(value),
        }

        if derives_total && item.is_leaf() {
            if let (Some(frequency), Some(amount)) =
                (item.target_frequency.value(), item.unit_amount.value())
            {
                item.total_target = NumericInput::from_value(frequency * amount);
            }
        }

        Ok(recalculate(next))
    }

    /// Deletes `id` and everything below it.
    ///
    /// The last remaining root cannot be removed.
    pub fn remove_subtree(&self, id: ItemId) -> Result<BudgetTree, CoreError> {
        let item = self.get(id)?;
        if item.parent_id.is_none() && self.roots.len() == 1 {
            return Err(CoreError::LastRoot {
                code: item.code.clone(),
            });
        }
        let path = self.path_of(id).ok_or(CoreError::ItemNotFound { id })?;
        let index = path[path.len() - 1];

        let mut next = self.clone();
        let siblings = next
            .siblings_mut(&path)
            .ok_or(CoreError::ItemNotFound { id })?;
        siblings.remove(index);

        Ok(settle(next))
    }
}
