//! Hierarchical code labels.
//!
//! Roots are lettered (`A`, `B`, ...), deeper items append their 1-based
//! sibling position to the parent's code (`A.1`, `A.1.2`). Codes are a pure
//! function of position and depth and are regenerated whenever the tree's
//! shape changes.

use crate::id::ItemId;
use crate::item::BudgetItem;
use crate::tree::BudgetTree;

/// Produces the code for the item at `sibling_index` (0-based) on `level`.
///
/// Level-1 labels run `A`..`Z`, then continue `AA`, `AB`, ... so that large
/// root lists never produce duplicate or non-letter labels. A deeper item
/// without a parent code gets its bare position.
pub fn generate_code(parent_code: Option<&str>, sibling_index: usize, level: u8) -> String {
    if level <= 1 {
        return root_label(sibling_index);
    }
    match parent_code {
        Some(parent) => format!("{}.{}", parent, sibling_index + 1),
        None => (sibling_index + 1).to_string(),
    }
}

/// Bijective base-26 lettering: 0 -> A, 25 -> Z, 26 -> AA.
fn root_label(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Re-applies [`generate_code`] across the whole tree.
///
/// Overwrites `code` and `order` on every node, and re-derives `level` and
/// `parent_id` from the node's position so all four agree with the shape.
pub fn regenerate_codes(mut tree: BudgetTree) -> BudgetTree {
    recode(&mut tree.roots, None, 1);
    tree
}

fn recode(items: &mut [BudgetItem], parent: Option<(ItemId, &str)>, level: u8) {
    for (index, item) in items.iter_mut().enumerate() {
        item.code = generate_code(parent.map(|(_, code)| code), index, level);
        item.order = index as u32 + 1;
        item.level = level;
        item.parent_id = parent.map(|(id, _)| id);

        let code = item.code.clone();
        recode(&mut item.children, Some((item.id, &code)), level + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_is_lettered() {
        assert_eq!(generate_code(None, 0, 1), "A");
        assert_eq!(generate_code(None, 1, 1), "B");
        assert_eq!(generate_code(None, 25, 1), "Z");
    }

    #[test]
    fn level_one_continues_past_z() {
        assert_eq!(generate_code(None, 26, 1), "AA");
        assert_eq!(generate_code(None, 27, 1), "AB");
        assert_eq!(generate_code(None, 51, 1), "AZ");
        assert_eq!(generate_code(None, 52, 1), "BA");
        assert_eq!(generate_code(None, 701, 1), "ZZ");
        assert_eq!(generate_code(None, 702, 1), "AAA");
    }

    #[test]
    fn deeper_levels_append_position() {
        assert_eq!(generate_code(Some("A"), 0, 2), "A.1");
        assert_eq!(generate_code(Some("A.1"), 2, 3), "A.1.3");
        assert_eq!(generate_code(Some("C.2.1"), 9, 4), "C.2.1.10");
    }

    #[test]
    fn parent_code_is_ignored_at_level_one() {
        assert_eq!(generate_code(Some("X"), 2, 1), "C");
    }

    #[test]
    fn regenerate_rewrites_codes_and_order() {
        let mut root = BudgetItem::empty(ItemId::Temporary(1), None, 1);
        root.code = "Q".into();
        let mut first = BudgetItem::empty(ItemId::Temporary(2), None, 7);
        first.code = "junk".into();
        let second = BudgetItem::empty(ItemId::Temporary(3), None, 2);
        root.children = vec![first, second];
        let tree = BudgetTree::from_roots(vec![root]);

        let tree = regenerate_codes(tree);
        let root = &tree.roots[0];
        assert_eq!(root.code, "A");
        assert_eq!(root.order, 1);
        assert_eq!(root.children[0].code, "A.1");
        assert_eq!(root.children[0].level, 2);
        assert_eq!(root.children[0].parent_id, Some(ItemId::Temporary(1)));
        assert_eq!(root.children[1].code, "A.2");
        assert_eq!(root.children[1].order, 2);
    }
}
