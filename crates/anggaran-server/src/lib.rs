//! HTTP/JSON API server for the anggaran budget editor.
//!
//! Exposes the item store (categories, periods, flat budget items) as JSON
//! routes, plus server-held editor sessions that drive the tree engine:
//! open a category/period, apply edits, inspect delete choices and save.

pub mod error;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod service;
pub mod state;
