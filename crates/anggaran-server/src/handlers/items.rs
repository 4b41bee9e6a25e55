//! Flat item handlers: the store contract over HTTP.

use axum::extract::{Path, Query, State};
use axum::Json;

use anggaran_core::{ItemPayload, ItemRecord};

use crate::error::ApiError;
use crate::schema::items::{ItemListResponse, ItemsQuery};
use crate::state::AppState;

/// Lists the flat items of one category/period.
///
/// `GET /items?category_id=&period_id=`
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<ItemListResponse>, ApiError> {
    let scope = query.scope().ok_or_else(|| {
        ApiError::BadRequest("category_id and period_id are both required".into())
    })?;
    let service = state.service.lock().await;
    let items = service.list_items(scope)?;
    Ok(Json(ItemListResponse { items }))
}

/// `POST /items`
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemRecord>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.create_item(&payload)?))
}

/// `PUT /items/{id}`
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemRecord>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.update_item(id, &payload)?))
}

/// Deletes an item and every descendant.
///
/// `DELETE /items/{id}`
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut service = state.service.lock().await;
    service.delete_item(id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
