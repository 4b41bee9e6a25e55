//! Identifier types for budget items and their grouping keys.
//!
//! [`ItemId`] distinguishes items that only exist in the editor
//! ([`ItemId::Temporary`]) from items the store has already assigned an id to
//! ([`ItemId::Persistent`]). The save path branches on the variant, never on
//! the shape of a string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a budget item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemId {
    /// Client-allocated id for an item that has not been saved yet.
    Temporary(u64),
    /// Id assigned by the store. Aligns with SQLite's `INTEGER PRIMARY KEY`.
    Persistent(i64),
}

impl ItemId {
    /// Returns true for ids that have never been persisted.
    pub fn is_temporary(&self) -> bool {
        matches!(self, ItemId::Temporary(_))
    }

    /// Returns the store id, if this item has one.
    pub fn persistent(&self) -> Option<i64> {
        match self {
            ItemId::Persistent(id) => Some(*id),
            ItemId::Temporary(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Temporary(seq) => write!(f, "temp-{}", seq),
            ItemId::Persistent(id) => write!(f, "{}", id),
        }
    }
}

/// Text that is neither `temp-<n>` nor a plain integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid item id '{0}'")]
pub struct ParseItemIdError(pub String);

/// Parses the [`Display`](fmt::Display) form back, as used in URL paths.
impl FromStr for ItemId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseItemIdError(s.to_string());
        match s.strip_prefix("temp-") {
            Some(seq) => seq.parse().map(ItemId::Temporary).map_err(|_| invalid()),
            None => s.parse().map(ItemId::Persistent).map_err(|_| invalid()),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Persistent(id)
    }
}

/// Financial category (kategori keuangan) foreign key. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

/// Budget period (periode anggaran) foreign key. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The category/period pair selecting which flat item set is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemScope {
    pub category: CategoryId,
    pub period: PeriodId,
}

impl ItemScope {
    pub fn new(category: CategoryId, period: PeriodId) -> Self {
        ItemScope { category, period }
    }
}

impl fmt::Display for ItemScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category={} period={}", self.category, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_and_persistent_are_distinct() {
        assert_ne!(ItemId::Temporary(1), ItemId::Persistent(1));
        assert!(ItemId::Temporary(1).is_temporary());
        assert!(!ItemId::Persistent(1).is_temporary());
    }

    #[test]
    fn persistent_accessor() {
        assert_eq!(ItemId::Persistent(42).persistent(), Some(42));
        assert_eq!(ItemId::Temporary(42).persistent(), None);
    }

    #[test]
    fn item_id_display() {
        assert_eq!(ItemId::Temporary(3).to_string(), "temp-3");
        assert_eq!(ItemId::Persistent(17).to_string(), "17");
    }

    #[test]
    fn item_id_parses_display_form() {
        assert_eq!("temp-3".parse::<ItemId>(), Ok(ItemId::Temporary(3)));
        assert_eq!("17".parse::<ItemId>(), Ok(ItemId::Persistent(17)));
        assert!("temp-x".parse::<ItemId>().is_err());
        assert!("A.1".parse::<ItemId>().is_err());
    }

    #[test]
    fn item_id_serde_shape() {
        let json = serde_json::to_string(&ItemId::Temporary(5)).unwrap();
        assert_eq!(json, r#"{"temporary":5}"#);
        let back: ItemId = serde_json::from_str(r#"{"persistent":9}"#).unwrap();
        assert_eq!(back, ItemId::Persistent(9));
    }

    #[test]
    fn scope_ids_serialize_transparently() {
        let scope = ItemScope::new(CategoryId(2), PeriodId(7));
        let json = serde_json::to_value(scope).unwrap();
        assert_eq!(json, serde_json::json!({ "category": 2, "period": 7 }));
    }
}
