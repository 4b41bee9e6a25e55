//! Router assembly for the anggaran HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/periods",
            get(handlers::catalog::list_periods).post(handlers::catalog::create_period),
        )
        // Flat items
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/items/{id}",
            put(handlers::items::update_item).delete(handlers::items::delete_item),
        )
        // Editor sessions
        .route("/editor/sessions", post(handlers::editor::open_session))
        .route(
            "/editor/sessions/{sid}",
            get(handlers::editor::get_session).delete(handlers::editor::close_session),
        )
        .route(
            "/editor/sessions/{sid}/edits",
            post(handlers::editor::apply_edit),
        )
        .route(
            "/editor/sessions/{sid}/items/{item}/deletion",
            get(handlers::editor::deletion_prompt),
        )
        .route("/editor/sessions/{sid}/save", post(handlers::editor::save))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
