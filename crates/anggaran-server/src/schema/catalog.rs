//! Category and period request/response types.

use anggaran_storage::{Category, Period};
use serde::{Deserialize, Serialize};

/// Request to create a financial category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(rename = "nama")]
    pub name: String,
}

/// Request to create a budget period.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePeriodRequest {
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "tahun")]
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodListResponse {
    pub periods: Vec<Period>,
}
