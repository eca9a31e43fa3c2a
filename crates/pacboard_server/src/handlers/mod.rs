//! HTTP request handlers.

/// Admin login endpoint.
pub mod auth;
/// Category upload/list/delete endpoints.
pub mod entry;
pub(crate) mod form;
