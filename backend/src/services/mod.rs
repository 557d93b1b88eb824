//! Module for core business logic services.
//!
//! These services own the side effects the handlers orchestrate: the watched
//! uploads folder, database backups and the audit trail kept as log documents.

pub mod audit;
pub mod backup;
pub mod uploads;
