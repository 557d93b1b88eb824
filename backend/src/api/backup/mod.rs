//! Module for the database backup API.

pub mod handlers;
pub mod routes;
