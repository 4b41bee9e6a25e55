//! API schema types for request/response definitions.
//!
//! Each sub-module defines the request and response types for one API area.
//! Field names follow the item wire format (`nama`, `kode`, `kategoriId`, ...).

pub mod catalog;
pub mod editor;
pub mod items;
