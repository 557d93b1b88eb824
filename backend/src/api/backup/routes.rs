//! Defines the HTTP routes for the database backup API.

use axum::{routing::get, Router};

use super::handlers::{make_backup, restore_backup};
use crate::state::SharedState;

pub fn backup_router() -> Router<SharedState> {
    Router::new()
        .route("/backup/make", get(make_backup))
        .route("/backup/restore", get(restore_backup))
}
