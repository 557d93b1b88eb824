//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for the API domains: service
//! health, log documents, record-session rendering, video recording and
//! storage, and database backups. Authentication routes live in `crate::auth`.

pub mod backup;
pub mod general;
pub mod logs;
pub mod render;
pub mod video;
