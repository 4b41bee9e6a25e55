//! HTTP handler modules for the anggaran API.
//!
//! Each sub-module implements thin handlers that parse requests, acquire the
//! service lock, delegate to [`BudgetService`](crate::service::BudgetService),
//! and return JSON responses. No business logic lives in handlers.

pub mod catalog;
pub mod editor;
pub mod items;
