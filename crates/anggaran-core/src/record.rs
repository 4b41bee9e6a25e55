//! Flat, persisted shapes of budget items.
//!
//! [`ItemRecord`] is what the store returns from `listItems`; [`ItemPayload`]
//! is what the save path sends on create and update. Numeric fields are
//! parsed numbers here, `None` where the editor field was blank.

use serde::{Deserialize, Serialize};

use crate::id::{CategoryId, ItemScope, PeriodId};
use crate::item::BudgetItem;

/// Body of a create/update call. Mirrors [`ItemRecord`] minus the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    #[serde(rename = "kategoriId")]
    pub category_id: CategoryId,
    #[serde(rename = "periodeId")]
    pub period_id: PeriodId,
    #[serde(rename = "parentId")]
    pub parent_id: Option<i64>,
    #[serde(rename = "kode")]
    pub code: String,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "deskripsi")]
    pub description: Option<String>,
    pub level: u8,
    #[serde(rename = "urutan")]
    pub order: u32,
    #[serde(rename = "targetFrekuensi")]
    pub target_frequency: Option<f64>,
    #[serde(rename = "satuanFrekuensi")]
    pub frequency_unit: Option<String>,
    #[serde(rename = "nominalSatuan")]
    pub unit_amount: Option<f64>,
    #[serde(rename = "totalTarget")]
    pub total_target: Option<f64>,
}

impl ItemPayload {
    /// Builds the payload for `item` under the resolved store parent id.
    pub fn from_item(item: &BudgetItem, scope: ItemScope, parent_id: Option<i64>) -> Self {
        ItemPayload {
            category_id: scope.category,
            period_id: scope.period,
            parent_id,
            code: item.code.clone(),
            name: item.name.trim().to_string(),
            description: non_blank(&item.description),
            level: item.level,
            order: item.order,
            target_frequency: item.target_frequency.value(),
            frequency_unit: non_blank(&item.frequency_unit),
            unit_amount: item.unit_amount.value(),
            total_target: item.total_target.value(),
        }
    }

    pub fn scope(&self) -> ItemScope {
        ItemScope::new(self.category_id, self.period_id)
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A persisted budget item as the store lists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: i64,
    #[serde(flatten)]
    pub payload: ItemPayload,
}

impl ItemRecord {
    pub fn new(id: i64, payload: ItemPayload) -> Self {
        ItemRecord { id, payload }
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.payload.parent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ItemId;
    use crate::item::NumericInput;

    #[test]
    fn blank_fields_become_null() {
        let mut item = BudgetItem::empty(ItemId::Temporary(1), None, 1);
        item.code = "A".into();
        item.name = "  Persembahan  ".into();
        item.description = "   ".into();
        item.target_frequency = NumericInput::new("abc");
        item.total_target = NumericInput::new("1000");
        let scope = ItemScope::new(CategoryId(1), PeriodId(2));

        let payload = ItemPayload::from_item(&item, scope, None);
        assert_eq!(payload.name, "Persembahan");
        assert_eq!(payload.description, None);
        assert_eq!(payload.target_frequency, None);
        assert_eq!(payload.frequency_unit, None);
        assert_eq!(payload.total_target, Some(1000.0));
        assert_eq!(payload.scope(), scope);
    }

    #[test]
    fn record_flattens_payload_on_the_wire() {
        let payload = ItemPayload {
            category_id: CategoryId(1),
            period_id: PeriodId(1),
            parent_id: None,
            code: "A".into(),
            name: "Pendapatan".into(),
            description: None,
            level: 1,
            order: 1,
            target_frequency: None,
            frequency_unit: None,
            unit_amount: None,
            total_target: Some(10.0),
        };
        let json = serde_json::to_value(ItemRecord::new(3, payload)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["kode"], "A");
        assert_eq!(json["kategoriId"], 1);
        assert_eq!(json["totalTarget"], 10.0);
    }
}
