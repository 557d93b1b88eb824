//! Module for the log documents API.
//!
//! The frontend and backend both push log entries here; operators read them
//! back filtered by id, type or origin.

pub mod handlers;
pub mod routes;
