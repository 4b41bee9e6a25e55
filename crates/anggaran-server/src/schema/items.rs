//! Flat item request/response types.
//!
//! These routes expose the store directly; create and update bodies are
//! [`ItemPayload`](anggaran_core::ItemPayload) values.

use anggaran_core::{CategoryId, ItemRecord, ItemScope, PeriodId};
use serde::{Deserialize, Serialize};

/// Query string of `GET /items`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemsQuery {
    pub category_id: Option<i64>,
    pub period_id: Option<i64>,
}

impl ItemsQuery {
    /// Both keys are required; `None` when either is missing.
    pub fn scope(&self) -> Option<ItemScope> {
        Some(ItemScope::new(
            CategoryId(self.category_id?),
            PeriodId(self.period_id?),
        ))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemRecord>,
}
