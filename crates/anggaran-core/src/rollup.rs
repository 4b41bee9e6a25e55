//! Bottom-up aggregation of monetary targets.
//!
//! After [`recalculate`], every node with children carries the sum of its
//! children's totals and has its leaf-only manual fields cleared. Leaves are
//! left exactly as the caller set them.

use serde::Serialize;

use crate::code::generate_code;
use crate::item::{BudgetItem, NumericInput, MAX_LEVEL};
use crate::tree::BudgetTree;

/// Recomputes derived totals, post-order.
pub fn recalculate(mut tree: BudgetTree) -> BudgetTree {
    for root in &mut tree.roots {
        recalculate_item(root);
    }
    tree
}

fn recalculate_item(item: &mut BudgetItem) {
    for child in &mut item.children {
        recalculate_item(child);
    }
    if item.children.is_empty() {
        return;
    }

    let sum: f64 = item.children.iter().map(|c| c.total_target.or_zero()).sum();
    item.total_target = NumericInput::from_value(sum);
    item.target_frequency = NumericInput::blank();
    item.frequency_unit.clear();
    item.unit_amount = NumericInput::blank();
}

/// A consistency problem found by [`audit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeIssue {
    /// Stored code differs from what position and depth produce.
    CodeMismatch { expected: String, found: String },
    /// A parent's total differs from the sum of its children.
    TotalMismatch { code: String, expected: f64, found: f64 },
    /// Item nested below the deepest allowed level.
    TooDeep { code: String, level: u8 },
}

/// Checks a tree built from stored records against the code and rollup
/// invariants without changing it.
pub fn audit(tree: &BudgetTree) -> Vec<TreeIssue> {
    let mut issues = Vec::new();
    audit_items(&tree.roots, None, 1, &mut issues);
    issues
}

fn audit_items(items: &[BudgetItem], parent_code: Option<&str>, level: u8, out: &mut Vec<TreeIssue>) {
    for (index, item) in items.iter().enumerate() {
        let expected = generate_code(parent_code, index, level);
        if item.code != expected {
            out.push(TreeIssue::CodeMismatch {
                expected: expected.clone(),
                found: item.code.clone(),
            });
        }
        if level > MAX_LEVEL {
            out.push(TreeIssue::TooDeep {
                code: item.code.clone(),
                level,
            });
        }
        if !item.children.is_empty() {
            let sum: f64 = item.children.iter().map(|c| c.total_target.or_zero()).sum();
            let found = item.total_target.or_zero();
            if (sum - found).abs() > 1e-6 {
                out.push(TreeIssue::TotalMismatch {
                    code: item.code.clone(),
                    expected: sum,
                    found,
                });
            }
        }
        audit_items(&item.children, Some(&expected), level + 1, out);
    }
}
