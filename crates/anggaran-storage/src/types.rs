//! Storage-layer types for the category and period catalogs.
//!
//! Categories and periods are chosen by an external selection UI; the tree
//! engine only ever sees their ids.

use serde::{Deserialize, Serialize};

use anggaran_core::{CategoryId, PeriodId};

/// A financial category (kategori keuangan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nama")]
    pub name: String,
}

/// A budget period (periode anggaran).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "tahun")]
    pub year: i32,
}
