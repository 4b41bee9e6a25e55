//! Category and period handlers.

use axum::extract::State;
use axum::Json;

use anggaran_storage::{Category, Period};

use crate::error::ApiError;
use crate::schema::catalog::{
    CategoryListResponse, CreateCategoryRequest, CreatePeriodRequest, PeriodListResponse,
};
use crate::state::AppState;

/// `GET /categories`
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let service = state.service.lock().await;
    let categories = service.list_categories()?;
    Ok(Json(CategoryListResponse { categories }))
}

/// `POST /categories`
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.create_category(&req.name)?))
}

/// `GET /periods`
pub async fn list_periods(
    State(state): State<AppState>,
) -> Result<Json<PeriodListResponse>, ApiError> {
    let service = state.service.lock().await;
    let periods = service.list_periods()?;
    Ok(Json(PeriodListResponse { periods }))
}

/// `POST /periods`
pub async fn create_period(
    State(state): State<AppState>,
    Json(req): Json<CreatePeriodRequest>,
) -> Result<Json<Period>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.create_period(&req.name, req.year)?))
}
