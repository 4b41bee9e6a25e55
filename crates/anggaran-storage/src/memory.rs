//! In-memory implementation of [`ItemStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and ephemeral
//! sessions. It keeps everything in HashMaps with the same semantics as the
//! SQLite backend, including cascading deletes.

use std::collections::HashMap;

use anggaran_core::{CategoryId, ItemPayload, ItemRecord, ItemScope, PeriodId};

use crate::error::StorageError;
use crate::traits::{check_parent, check_payload, ItemStore};
use crate::types::{Category, Period};

/// In-memory implementation of [`ItemStore`].
#[derive(Debug)]
pub struct InMemoryStore {
    categories: HashMap<CategoryId, Category>,
    periods: HashMap<PeriodId, Period>,
    items: HashMap<i64, ItemRecord>,
    next_id: i64,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        InMemoryStore {
            categories: HashMap::new(),
            periods: HashMap::new(),
            items: HashMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_scope(&self, scope: ItemScope) -> Result<(), StorageError> {
        if !self.categories.contains_key(&scope.category) {
            return Err(StorageError::CategoryNotFound(scope.category.0));
        }
        if !self.periods.contains_key(&scope.period) {
            return Err(StorageError::PeriodNotFound(scope.period.0));
        }
        Ok(())
    }

    fn check(&self, payload: &ItemPayload, self_id: Option<i64>) -> Result<(), StorageError> {
        check_payload(payload)?;
        self.check_scope(payload.scope())?;
        if let Some(parent_id) = payload.parent_id {
            let parent = self
                .items
                .get(&parent_id)
                .ok_or_else(|| StorageError::IntegrityError {
                    reason: format!("parent {} does not exist", parent_id),
                })?;
            check_parent(payload, parent, self_id)?;
        }
        Ok(())
    }

    /// The item and every descendant, by id.
    fn subtree(&self, id: i64) -> Vec<i64> {
        let mut out = vec![id];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            out.extend(
                self.items
                    .values()
                    .filter(|r| r.parent_id() == Some(current))
                    .map(|r| r.id),
            );
            cursor += 1;
        }
        out
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore for InMemoryStore {
    fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let mut categories: Vec<Category> = self.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.id.0);
        Ok(categories)
    }

    fn create_category(&mut self, name: &str) -> Result<Category, StorageError> {
        if self.categories.values().any(|c| c.name == name) {
            return Err(StorageError::IntegrityError {
                reason: format!("category '{}' already exists", name),
            });
        }
        let category = Category {
            id: CategoryId(self.categories.len() as i64 + 1),
            name: name.to_string(),
        };
        self.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn list_periods(&self) -> Result<Vec<Period>, StorageError> {
        let mut periods: Vec<Period> = self.periods.values().cloned().collect();
        periods.sort_by_key(|p| p.id.0);
        Ok(periods)
    }

    fn create_period(&mut self, name: &str, year: i32) -> Result<Period, StorageError> {
        let period = Period {
            id: PeriodId(self.periods.len() as i64 + 1),
            name: name.to_string(),
            year,
        };
        self.periods.insert(period.id, period.clone());
        Ok(period)
    }

    fn list_items(&self, scope: ItemScope) -> Result<Vec<ItemRecord>, StorageError> {
        self.check_scope(scope)?;
        let mut items: Vec<ItemRecord> = self
            .items
            .values()
            .filter(|r| r.payload.scope() == scope)
            .cloned()
            .collect();
        items.sort_by_key(|r| (r.payload.level, r.payload.order, r.id));
        Ok(items)
    }

    fn get_item(&self, id: i64) -> Result<ItemRecord, StorageError> {
        self.items
            .get(&id)
            .cloned()
            .ok_or(StorageError::ItemNotFound(id))
    }

    fn create_item(&mut self, payload: &ItemPayload) -> Result<ItemRecord, StorageError> {
        self.check(payload, None)?;
        let record = ItemRecord::new(self.allocate_id(), payload.clone());
        self.items.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_item(&mut self, id: i64, payload: &ItemPayload) -> Result<ItemRecord, StorageError> {
        if !self.items.contains_key(&id) {
            return Err(StorageError::ItemNotFound(id));
        }
        self.check(payload, Some(id))?;
        let record = ItemRecord::new(id, payload.clone());
        self.items.insert(id, record.clone());
        Ok(record)
    }

    fn delete_item(&mut self, id: i64) -> Result<(), StorageError> {
        if !self.items.contains_key(&id) {
            return Err(StorageError::ItemNotFound(id));
        }
        for doomed in self.subtree(id) {
            self.items.remove(&doomed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (InMemoryStore, ItemScope) {
        let mut store = InMemoryStore::new();
        let category = store.create_category("Persembahan").unwrap();
        let period = store.create_period("Anggaran 2025", 2025).unwrap();
        (store, ItemScope::new(category.id, period.id))
    }

    fn payload(scope: ItemScope, parent: Option<i64>, code: &str, level: u8, order: u32) -> ItemPayload {
        ItemPayload {
            category_id: scope.category,
            period_id: scope.period,
            parent_id: parent,
            code: code.into(),
            name: format!("Pos {}", code),
            description: None,
            level,
            order,
            target_frequency: None,
            frequency_unit: None,
            unit_amount: None,
            total_target: None,
        }
    }

    #[test]
    fn create_and_list_items() {
        let (mut store, scope) = setup();
        let root = store.create_item(&payload(scope, None, "A", 1, 1)).unwrap();
        store
            .create_item(&payload(scope, Some(root.id), "A.2", 2, 2))
            .unwrap();
        store
            .create_item(&payload(scope, Some(root.id), "A.1", 2, 1))
            .unwrap();

        let codes: Vec<String> = store
            .list_items(scope)
            .unwrap()
            .into_iter()
            .map(|r| r.payload.code)
            .collect();
        assert_eq!(codes, vec!["A", "A.1", "A.2"]);
    }

    #[test]
    fn list_items_is_scoped() {
        let (mut store, scope) = setup();
        let other_period = store.create_period("Anggaran 2026", 2026).unwrap();
        let other = ItemScope::new(scope.category, other_period.id);
        store.create_item(&payload(scope, None, "A", 1, 1)).unwrap();
        store.create_item(&payload(other, None, "A", 1, 1)).unwrap();
        assert_eq!(store.list_items(scope).unwrap().len(), 1);
        assert_eq!(store.list_items(other).unwrap().len(), 1);
    }

    #[test]
    fn delete_cascades_to_descendants() {
        let (mut store, scope) = setup();
        let a = store.create_item(&payload(scope, None, "A", 1, 1)).unwrap();
        let a1 = store.create_item(&payload(scope, Some(a.id), "A.1", 2, 1)).unwrap();
        store
            .create_item(&payload(scope, Some(a1.id), "A.1.1", 3, 1))
            .unwrap();
        store.create_item(&payload(scope, None, "B", 1, 2)).unwrap();

        store.delete_item(a.id).unwrap();
        let left = store.list_items(scope).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].payload.code, "B");
    }

    #[test]
    fn deleting_missing_item_is_not_found() {
        let (mut store, _) = setup();
        let err = store.delete_item(77).unwrap_err();
        assert!(matches!(err, StorageError::ItemNotFound(77)));
        assert!(err.is_not_found());
    }

    #[test]
    fn parent_must_exist_in_same_scope() {
        let (mut store, scope) = setup();
        let err = store
            .create_item(&payload(scope, Some(999), "A.1", 2, 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::IntegrityError { .. }));

        let other_period = store.create_period("Anggaran 2026", 2026).unwrap();
        let other = ItemScope::new(scope.category, other_period.id);
        let parent = store.create_item(&payload(other, None, "A", 1, 1)).unwrap();
        let err = store
            .create_item(&payload(scope, Some(parent.id), "A.1", 2, 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::IntegrityError { .. }));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let (mut store, scope) = setup();
        let bad = ItemScope::new(CategoryId(42), scope.period);
        assert!(matches!(
            store.create_item(&payload(bad, None, "A", 1, 1)),
            Err(StorageError::CategoryNotFound(42))
        ));
        assert!(store.list_items(bad).is_err());
    }

    #[test]
    fn update_overwrites_fields() {
        let (mut store, scope) = setup();
        let a = store.create_item(&payload(scope, None, "A", 1, 1)).unwrap();
        let mut changed = payload(scope, None, "A", 1, 1);
        changed.total_target = Some(1_500_000.0);
        store.update_item(a.id, &changed).unwrap();
        assert_eq!(store.get_item(a.id).unwrap().payload.total_target, Some(1_500_000.0));
        assert!(matches!(
            store.update_item(99, &changed),
            Err(StorageError::ItemNotFound(99))
        ));
    }

    #[test]
    fn duplicate_category_names_are_rejected() {
        let (mut store, _) = setup();
        assert!(store.create_category("Persembahan").is_err());
        assert_eq!(store.list_categories().unwrap().len(), 1);
    }
}
