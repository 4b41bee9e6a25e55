//! Application state with shared `BudgetService` for concurrent access.
//!
//! [`AppState`] wraps the service in `Arc<tokio::sync::Mutex<>>` for use with
//! axum handlers. Uses `tokio::sync::Mutex` (async-aware) so handlers await
//! the lock without blocking the tokio runtime. `BudgetService` owns a
//! `rusqlite::Connection`, which is `!Sync`, so an `RwLock` is not an option.
//!
//! Holding the lock for the whole of a save also means a second save of the
//! same session cannot start while one is in flight.

use std::sync::Arc;

use crate::error::ApiError;
use crate::service::BudgetService;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<tokio::sync::Mutex<BudgetService>>,
}

impl AppState {
    /// Creates a new `AppState` with a `BudgetService` backed by the given
    /// SQLite database path.
    pub fn new(db_path: &str) -> Result<Self, ApiError> {
        Ok(Self::from_service(BudgetService::new(db_path)?))
    }

    /// Wraps an already configured service.
    pub fn from_service(service: BudgetService) -> Self {
        AppState {
            service: Arc::new(tokio::sync::Mutex::new(service)),
        }
    }

    /// Creates a new `AppState` with an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ApiError> {
        Ok(Self::from_service(BudgetService::in_memory()?))
    }
}
