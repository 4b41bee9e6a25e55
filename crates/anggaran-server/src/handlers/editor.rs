//! Editor session handlers.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use anggaran_core::{DeletionPrompt, ItemId, ItemScope};

use crate::error::ApiError;
use crate::schema::editor::{Edit, EditResponse, OpenSessionRequest, SaveResponse, SessionView};
use crate::state::AppState;

/// Opens an editor on a category/period.
///
/// `POST /editor/sessions`
pub async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let mut service = state.service.lock().await;
    let view = service.open_session(ItemScope::new(req.category_id, req.period_id))?;
    Ok(Json(view))
}

/// `GET /editor/sessions/{sid}`
pub async fn get_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.session_view(sid)?))
}

/// Discards a session without saving.
///
/// `DELETE /editor/sessions/{sid}`
pub async fn close_session(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut service = state.service.lock().await;
    service.close_session(sid)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Applies one edit to the session's tree.
///
/// `POST /editor/sessions/{sid}/edits`
pub async fn apply_edit(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
    Json(edit): Json<Edit>,
) -> Result<Json<EditResponse>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.apply_edit(sid, edit)?))
}

/// Describes the delete choice for an item. `{item}` is `temp-<n>` for
/// unsaved items or the plain store id.
///
/// `GET /editor/sessions/{sid}/items/{item}/deletion`
pub async fn deletion_prompt(
    State(state): State<AppState>,
    Path((sid, item)): Path<(Uuid, String)>,
) -> Result<Json<DeletionPrompt>, ApiError> {
    let item: ItemId = item
        .parse()
        .map_err(|e: anggaran_core::ParseItemIdError| ApiError::BadRequest(e.to_string()))?;
    let mut service = state.service.lock().await;
    Ok(Json(service.deletion_prompt(sid, item)?))
}

/// `POST /editor/sessions/{sid}/save`
pub async fn save(
    State(state): State<AppState>,
    Path(sid): Path<Uuid>,
) -> Result<Json<SaveResponse>, ApiError> {
    let mut service = state.service.lock().await;
    Ok(Json(service.save(sid)?))
}
