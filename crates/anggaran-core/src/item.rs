//! The budget item node and its editable fields.
//!
//! [`BudgetItem`] is the single entity of the anggaran tree. Each node owns
//! its children exclusively; the tree never cross-links nodes. Numeric inputs
//! are kept as the raw text the user typed ([`NumericInput`]) so blank and
//! half-typed values survive a round trip through the editor.

use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// Deepest level an item can sit at. Level-4 items are the ones realization
/// entries are recorded against elsewhere in the application.
pub const MAX_LEVEL: u8 = 4;

/// Raw text of a numeric field.
///
/// Blank or unparsable text counts as zero when summed but is kept as-is for
/// display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericInput(String);

impl NumericInput {
    pub fn new(text: impl Into<String>) -> Self {
        NumericInput(text.into())
    }

    /// An empty input.
    pub fn blank() -> Self {
        NumericInput(String::new())
    }

    /// Renders a computed amount. Whole numbers print without a fraction.
    pub fn from_value(value: f64) -> Self {
        // Normalise -0.0 so cleared sums never render as "-0".
        let value = if value == 0.0 { 0.0 } else { value };
        NumericInput(value.to_string())
    }

    pub fn from_optional(value: Option<f64>) -> Self {
        value.map(Self::from_value).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parses the trimmed text. Blank, unparsable and non-finite input is `None`.
    pub fn value(&self) -> Option<f64> {
        let text = self.0.trim();
        if text.is_empty() {
            return None;
        }
        text.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// The parsed value, or 0 for blank and unparsable input.
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

impl From<&str> for NumericInput {
    fn from(text: &str) -> Self {
        NumericInput::new(text)
    }
}

/// One node of the budget tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: ItemId,
    #[serde(rename = "parentId")]
    pub parent_id: Option<ItemId>,
    /// Depth, 1 for roots through [`MAX_LEVEL`].
    pub level: u8,
    /// Hierarchical label (`A`, `A.1`, `A.1.2`). Derived, never hand-edited.
    #[serde(rename = "kode")]
    pub code: String,
    /// 1-based position among siblings. Derived from array position.
    #[serde(rename = "urutan")]
    pub order: u32,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: String,
    #[serde(rename = "targetFrekuensi")]
    pub target_frequency: NumericInput,
    #[serde(rename = "satuanFrekuensi")]
    pub frequency_unit: String,
    #[serde(rename = "nominalSatuan")]
    pub unit_amount: NumericInput,
    #[serde(rename = "totalTarget")]
    pub total_target: NumericInput,
    pub children: Vec<BudgetItem>,
}

impl BudgetItem {
    /// A fresh node with empty fields. Code and order are filled in by the
    /// next code regeneration.
    pub fn empty(id: ItemId, parent_id: Option<ItemId>, level: u8) -> Self {
        BudgetItem {
            id,
            parent_id,
            level,
            code: String::new(),
            order: 0,
            name: String::new(),
            description: String::new(),
            target_frequency: NumericInput::blank(),
            frequency_unit: String::new(),
            unit_amount: NumericInput::blank(),
            total_target: NumericInput::blank(),
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, the node itself included.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(BudgetItem::subtree_size).sum::<usize>()
    }

    /// Ids of this node and all descendants, pre-order.
    pub fn subtree_ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::with_capacity(self.subtree_size());
        collect_ids(self, &mut ids);
        ids
    }
}

fn collect_ids(item: &BudgetItem, out: &mut Vec<ItemId>) {
    out.push(item.id);
    for child in &item.children {
        collect_ids(child, out);
    }
}

/// A user edit of a single field.
///
/// Numeric fields carry the raw text as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value")]
pub enum ItemField {
    #[serde(rename = "nama")]
    Name(String),
    #[serde(rename = "deskripsi")]
    Description(String),
    #[serde(rename = "targetFrekuensi")]
    TargetFrequency(String),
    #[serde(rename = "satuanFrekuensi")]
    FrequencyUnit(String),
    #[serde(rename = "nominalSatuan")]
    UnitAmount(String),
    #[serde(rename = "totalTarget")]
    TotalTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_input_parses_trimmed_text() {
        assert_eq!(NumericInput::new(" 12 ").value(), Some(12.0));
        assert_eq!(NumericInput::new("2.5").value(), Some(2.5));
    }

    #[test]
    fn numeric_input_blank_and_garbage_are_zero() {
        assert_eq!(NumericInput::blank().value(), None);
        assert_eq!(NumericInput::new("abc").value(), None);
        assert_eq!(NumericInput::new("NaN").value(), None);
        assert_eq!(NumericInput::new("abc").or_zero(), 0.0);
        // Raw text is preserved for display.
        assert_eq!(NumericInput::new("abc").as_str(), "abc");
    }

    #[test]
    fn whole_amounts_render_without_fraction() {
        assert_eq!(NumericInput::from_value(1_500_000.0).as_str(), "1500000");
        assert_eq!(NumericInput::from_value(0.5).as_str(), "0.5");
        assert_eq!(NumericInput::from_value(-0.0).as_str(), "0");
    }

    #[test]
    fn subtree_size_is_inclusive() {
        let mut root = BudgetItem::empty(ItemId::Temporary(1), None, 1);
        let mut child = BudgetItem::empty(ItemId::Temporary(2), Some(root.id), 2);
        child
            .children
            .push(BudgetItem::empty(ItemId::Temporary(3), Some(child.id), 3));
        root.children.push(child);
        assert_eq!(root.subtree_size(), 3);
        assert_eq!(
            root.subtree_ids(),
            vec![ItemId::Temporary(1), ItemId::Temporary(2), ItemId::Temporary(3)]
        );
    }

    #[test]
    fn item_field_wire_shape() {
        let field: ItemField =
            serde_json::from_str(r#"{"field":"nominalSatuan","value":"250000"}"#).unwrap();
        assert_eq!(field, ItemField::UnitAmount("250000".into()));
    }

    #[test]
    fn budget_item_uses_wire_names() {
        let item = BudgetItem::empty(ItemId::Persistent(4), None, 1);
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("kode").is_some());
        assert!(json.get("totalTarget").is_some());
        assert_eq!(json["parentId"], serde_json::Value::Null);
    }
}
